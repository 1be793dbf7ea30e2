//! Resend cooldown countdown.
//!
//! A background task ticks once per second and publishes the remaining
//! seconds on a watch channel. The task is owned by the [`Countdown`] handle:
//! cancelling or dropping the handle stops it, so a session never has two
//! countdowns decrementing the same counter.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

pub struct Countdown {
    remaining: watch::Receiver<u32>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down from `seconds`. Must be called inside a tokio runtime.
    pub fn start(seconds: u32) -> Self {
        let (tx, remaining) = watch::channel(seconds);
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        let mut ticks = interval_at(Instant::now() + TICK, TICK);
        let handle = tokio::spawn(async move {
            let mut left = seconds;
            while left > 0 {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(left, "countdown cancelled");
                        return;
                    }
                    _ = ticks.tick() => {
                        left -= 1;
                        if tx.send(left).is_err() {
                            return;
                        }
                    }
                }
            }
            debug!("countdown finished");
        });

        Self {
            remaining,
            cancel,
            handle,
        }
    }

    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait for the next tick. Returns `None` once the countdown has stopped.
    pub async fn changed(&mut self) -> Option<u32> {
        self.remaining.changed().await.ok()?;
        Some(*self.remaining.borrow_and_update())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining", &self.remaining())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
