// Code delivery seam
//
// The login flow talks to an OTP service through `BaseOtpGateway`. The demo
// ships `SimulatedGateway`, which issues codes in memory after a simulated
// network round trip. Tests inject scripted gateways instead.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::{MobileNumber, OneTimeCode};

#[async_trait]
pub trait BaseOtpGateway: Send + Sync {
    /// Issue a fresh code for `mobile`, resolving after one round trip
    async fn send_otp(&self, mobile: &MobileNumber) -> Result<OneTimeCode>;

    /// One round trip for a verification submission
    ///
    /// The comparison itself happens in the session against the code it
    /// holds; the gateway only contributes latency (and possibly failure).
    async fn verify_round_trip(&self, mobile: &MobileNumber) -> Result<()>;
}

// =============================================================================
// Latency
// =============================================================================

/// Bounds of a simulated round trip. `min` is always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    min: Duration,
    max: Duration,
}

impl LatencyProfile {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min.is_zero() {
            bail!("simulated latency must be non-zero");
        }
        if max < min {
            bail!(
                "simulated latency max ({}ms) is below min ({}ms)",
                max.as_millis(),
                min.as_millis()
            );
        }
        Ok(Self { min, max })
    }

    /// Fixed round trip of `delay`
    pub fn fixed(delay: Duration) -> Result<Self> {
        Self::new(delay, delay)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rng.u64(min..=max))
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(400),
            max: Duration::from_millis(900),
        }
    }
}

// =============================================================================
// Simulated gateway
// =============================================================================

/// A code "delivered" by the simulated gateway
///
/// Stands in for the text message a real service would send.
#[derive(Debug, Clone)]
pub struct DeliveredCode {
    pub mobile: MobileNumber,
    pub code: OneTimeCode,
}

pub struct SimulatedGateway {
    rng: Mutex<fastrand::Rng>,
    latency: LatencyProfile,
    outbox: Option<mpsc::UnboundedSender<DeliveredCode>>,
}

impl SimulatedGateway {
    pub fn new(latency: LatencyProfile) -> Self {
        Self::with_rng(latency, fastrand::Rng::new())
    }

    /// Deterministic codes and delays for reproducible demos
    pub fn with_seed(latency: LatencyProfile, seed: u64) -> Self {
        Self::with_rng(latency, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(latency: LatencyProfile, rng: fastrand::Rng) -> Self {
        Self {
            rng: Mutex::new(rng),
            latency,
            outbox: None,
        }
    }

    /// Copy every issued code to `outbox`
    pub fn with_outbox(mut self, outbox: mpsc::UnboundedSender<DeliveredCode>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    fn next_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.latency.sample(&mut rng)
    }

    fn next_code(&self) -> OneTimeCode {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        OneTimeCode::random(&mut rng)
    }
}

#[async_trait]
impl BaseOtpGateway for SimulatedGateway {
    async fn send_otp(&self, mobile: &MobileNumber) -> Result<OneTimeCode> {
        let delay = self.next_delay();
        debug!(
            mobile_hash = %mobile.hashed(),
            delay_ms = delay.as_millis() as u64,
            "simulating otp send"
        );
        tokio::time::sleep(delay).await;

        let code = self.next_code();
        if let Some(outbox) = &self.outbox {
            // Nobody reading the outbox is fine; the code still lives in the session.
            let _ = outbox.send(DeliveredCode {
                mobile: mobile.clone(),
                code: code.clone(),
            });
        }
        Ok(code)
    }

    async fn verify_round_trip(&self, mobile: &MobileNumber) -> Result<()> {
        let delay = self.next_delay();
        debug!(
            mobile_hash = %mobile.hashed(),
            delay_ms = delay.as_millis() as u64,
            "simulating otp verify"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
