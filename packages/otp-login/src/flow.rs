//! Async login driver.
//!
//! [`LoginFlow`] wraps an [`AuthSession`] and a gateway, runs the simulated
//! round trips, and publishes [`LoginEvent`]s. Each request method borrows
//! the flow mutably for the whole round trip, so requests on one flow can
//! never overlap. Dropping a request future cancels it: the outstanding
//! ticket is abandoned and the session keeps nothing of the request except
//! the typed mobile text.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::LoginConfig;
use crate::error::AuthError;
use crate::events::{LoginEvent, LANDING_ROUTE};
use crate::gateway::{BaseOtpGateway, SimulatedGateway};
use crate::models::Direction;
use crate::session::{AuthSession, CodeRequest, Completion, SessionSnapshot, Ticket};

const EVENT_CAPACITY: usize = 32;

/// Result of a trigger that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The request ran and its result was applied
    Completed,
    /// The trigger was inert (wrong stage, cooldown running, or stale result)
    Ignored,
}

/// Holds an open ticket across an await.
///
/// If the owning future is dropped before the request is taken back, the
/// ticket is abandoned so the session does not stay busy forever.
struct Pending<'a, R: AsRef<Ticket>> {
    session: &'a mut AuthSession,
    request: Option<R>,
}

impl<'a, R: AsRef<Ticket>> Pending<'a, R> {
    fn new(session: &'a mut AuthSession, request: R) -> Self {
        Self {
            session,
            request: Some(request),
        }
    }

    fn take(&mut self) -> Option<R> {
        self.request.take()
    }

    fn session(&mut self) -> &mut AuthSession {
        &mut *self.session
    }
}

impl<R: AsRef<Ticket>> Drop for Pending<'_, R> {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            self.session.abandon(request.as_ref());
        }
    }
}

pub struct LoginFlow {
    session: AuthSession,
    gateway: Arc<dyn BaseOtpGateway>,
    events: broadcast::Sender<LoginEvent>,
}

impl LoginFlow {
    pub fn new(config: &LoginConfig, gateway: Arc<dyn BaseOtpGateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: AuthSession::new(config),
            gateway,
            events,
        }
    }

    /// Flow backed by the in-memory gateway described by `config`
    pub fn simulated(config: &LoginConfig) -> Self {
        let gateway = match config.rng_seed {
            Some(seed) => SimulatedGateway::with_seed(config.latency, seed),
            None => SimulatedGateway::new(config.latency),
        };
        Self::new(config, Arc::new(gateway))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoginEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AuthSession {
        &mut self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    // =========================================================================
    // Round trips
    // =========================================================================

    /// Validate the number, then issue a first code after one round trip.
    pub async fn request_code(&mut self, input: &str) -> Result<Submission, AuthError> {
        let Some(request) = self.session.begin_code_request(input)? else {
            return Ok(Submission::Ignored);
        };
        self.issue(request).await
    }

    /// Issue a replacement code. Ignored while the cooldown is running.
    pub async fn resend_code(&mut self) -> Result<Submission, AuthError> {
        let Some(request) = self.session.begin_resend() else {
            return Ok(Submission::Ignored);
        };
        self.issue(request).await
    }

    async fn issue(&mut self, request: CodeRequest) -> Result<Submission, AuthError> {
        let mobile = request.mobile.clone();
        let resend = request.is_resend();

        let mut pending = Pending::new(&mut self.session, request);
        let sent = self.gateway.send_otp(&mobile).await;
        let Some(request) = pending.take() else {
            return Ok(Submission::Ignored);
        };

        let code = match sent {
            Ok(code) => code,
            Err(e) => {
                return Err(pending
                    .session()
                    .fail_request(request.as_ref(), AuthError::Gateway(e)))
            }
        };

        if pending.session().complete_code_request(request, code) == Completion::Discarded {
            return Ok(Submission::Ignored);
        }
        drop(pending);

        let session_id = self.session.id();
        let masked_mobile = mobile.masked();
        let cooldown_secs = self.session.cooldown_seconds_remaining();
        self.emit(if resend {
            LoginEvent::CodeResent {
                session_id,
                masked_mobile,
                cooldown_secs,
            }
        } else {
            LoginEvent::CodeSent {
                session_id,
                masked_mobile,
                cooldown_secs,
            }
        });
        Ok(Submission::Completed)
    }

    /// Submit the entered code.
    ///
    /// `Completed` means the session is now verified and a
    /// [`LoginEvent::Verified`] was published.
    pub async fn verify_code(&mut self) -> Result<Submission, AuthError> {
        let Some(request) = self.session.begin_verification()? else {
            return Ok(Submission::Ignored);
        };
        let mobile = request.mobile.clone();

        let mut pending = Pending::new(&mut self.session, request);
        let round_trip = self.gateway.verify_round_trip(&mobile).await;
        let Some(request) = pending.take() else {
            return Ok(Submission::Ignored);
        };

        if let Err(e) = round_trip {
            return Err(pending
                .session()
                .fail_request(request.as_ref(), AuthError::Gateway(e)));
        }

        let result = pending.session().complete_verification(request);
        drop(pending);

        let session_id = self.session.id();
        match result {
            Ok(Completion::Applied) => {
                self.emit(LoginEvent::Verified {
                    session_id,
                    mobile,
                    verified_at: Utc::now(),
                    landing_route: LANDING_ROUTE.to_string(),
                });
                Ok(Submission::Completed)
            }
            Ok(Completion::Discarded) => Ok(Submission::Ignored),
            Err(e) => {
                if matches!(e, AuthError::IncorrectCode) {
                    self.emit(LoginEvent::VerificationFailed {
                        session_id,
                        failed_attempts: self.session.failed_attempts(),
                    });
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Local actions
    // =========================================================================

    pub fn set_mobile_input(&mut self, text: impl Into<String>) {
        self.session.set_mobile_input(text);
    }

    pub fn enter_digit(&mut self, index: usize, value: &str) -> bool {
        self.session.enter_digit(index, value)
    }

    pub fn backspace(&mut self, index: usize) {
        self.session.backspace(index);
    }

    pub fn navigate(&mut self, index: usize, direction: Direction) {
        self.session.navigate(index, direction);
    }

    pub fn paste(&mut self, index: usize, text: &str) -> usize {
        self.session.paste(index, text)
    }

    pub fn change_mobile_number(&mut self) {
        self.session.change_mobile_number();
        self.emit(LoginEvent::NumberChanged {
            session_id: self.session.id(),
        });
    }

    fn emit(&self, event: LoginEvent) {
        // No subscribers is fine
        if self.events.send(event).is_err() {
            debug!(session_id = %self.session.id(), "login event had no subscribers");
        }
    }
}
