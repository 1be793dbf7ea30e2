//! Login attempt state.
//!
//! [`AuthSession`] owns everything one login attempt needs: the stage, the
//! validated number, the issued code, the segmented entry, the resend
//! countdown and the last error message. All mutation goes through `&mut self`
//! so the session needs no locking.
//!
//! Simulated network calls are two-phase. A `begin_*` method validates input
//! and opens a [`Ticket`]; the matching `complete_*` method applies the result.
//! While a ticket is open every trigger is inert, and completing with a ticket
//! the session no longer expects (because the user changed the number in the
//! meantime) is discarded without touching state.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LoginConfig;
use crate::countdown::Countdown;
use crate::error::AuthError;
use crate::models::{CodeEntry, Direction, MobileNumber, OneTimeCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingMobile,
    AwaitingCode,
    /// Terminal
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    SendCode,
    Resend,
    Verify,
}

/// An outstanding simulated round trip
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    kind: RequestKind,
}

impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// Validated request to issue a code
#[derive(Debug)]
pub struct CodeRequest {
    ticket: Ticket,
    pub mobile: MobileNumber,
}

impl CodeRequest {
    pub fn is_resend(&self) -> bool {
        self.ticket.kind == RequestKind::Resend
    }
}

impl AsRef<Ticket> for CodeRequest {
    fn as_ref(&self) -> &Ticket {
        &self.ticket
    }
}

/// Validated request to check the entered code
#[derive(Debug)]
pub struct VerifyRequest {
    ticket: Ticket,
    pub mobile: MobileNumber,
    pub entered: String,
}

impl AsRef<Ticket> for VerifyRequest {
    fn as_ref(&self) -> &Ticket {
        &self.ticket
    }
}

/// Whether a completion was applied or dropped as stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded,
}

/// What the view renders
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub stage: Stage,
    pub mobile_input: String,
    pub masked_mobile: Option<String>,
    pub digits: Vec<Option<char>>,
    pub focused: usize,
    pub cooldown_seconds_remaining: u32,
    pub last_error: Option<String>,
    pub busy: bool,
}

/// State of a single login attempt
///
/// # Panics
///
/// [`AuthSession::complete_code_request`] starts the resend [`Countdown`],
/// which spawns a tokio task. Calling it outside a tokio runtime panics.
#[derive(Debug)]
pub struct AuthSession {
    id: Uuid,
    stage: Stage,
    mobile_input: String,
    mobile: Option<MobileNumber>,
    issued_code: Option<OneTimeCode>,
    entry: CodeEntry,
    countdown: Option<Countdown>,
    resend_cooldown_secs: u32,
    last_error: Option<String>,
    in_flight: Option<u64>,
    next_ticket: u64,
    failed_attempts: u32,
}

impl AuthSession {
    pub fn new(config: &LoginConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::AwaitingMobile,
            mobile_input: String::new(),
            mobile: None,
            issued_code: None,
            entry: CodeEntry::new(),
            countdown: None,
            resend_cooldown_secs: config.resend_cooldown_secs,
            last_error: None,
            in_flight: None,
            next_ticket: 0,
            failed_attempts: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_verified(&self) -> bool {
        self.stage == Stage::Verified
    }

    /// Raw text of the mobile field, kept across "change number"
    pub fn mobile_input(&self) -> &str {
        &self.mobile_input
    }

    pub fn set_mobile_input(&mut self, text: impl Into<String>) {
        self.mobile_input = text.into();
    }

    pub fn mobile(&self) -> Option<&MobileNumber> {
        self.mobile.as_ref()
    }

    pub fn issued_code(&self) -> Option<&OneTimeCode> {
        self.issued_code.as_ref()
    }

    pub fn entry(&self) -> &CodeEntry {
        &self.entry
    }

    pub fn cooldown_seconds_remaining(&self) -> u32 {
        self.countdown.as_ref().map_or(0, Countdown::remaining)
    }

    /// The running countdown, for views that re-render on every tick
    pub fn countdown_mut(&mut self) -> Option<&mut Countdown> {
        self.countdown.as_mut()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A simulated request is outstanding; triggers are inert
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            stage: self.stage,
            mobile_input: self.mobile_input.clone(),
            masked_mobile: self.mobile.as_ref().map(MobileNumber::masked),
            digits: self.entry.slots().to_vec(),
            focused: self.entry.focused(),
            cooldown_seconds_remaining: self.cooldown_seconds_remaining(),
            last_error: self.last_error.clone(),
            busy: self.is_busy(),
        }
    }

    // =========================================================================
    // Code requests
    // =========================================================================

    /// Validate `input` and open a request for a first code.
    ///
    /// Returns `Ok(None)` when the trigger is inert (wrong stage or a request
    /// already outstanding).
    pub fn begin_code_request(&mut self, input: &str) -> Result<Option<CodeRequest>, AuthError> {
        if self.stage != Stage::AwaitingMobile || self.is_busy() {
            debug!(session_id = %self.id, stage = ?self.stage, "code request ignored");
            return Ok(None);
        }

        self.mobile_input = input.to_string();
        let mobile = match MobileNumber::parse(input) {
            Ok(mobile) => mobile,
            Err(e) => return Err(self.record(e)),
        };

        self.last_error = None;
        let ticket = self.open_ticket(RequestKind::SendCode);
        Ok(Some(CodeRequest { ticket, mobile }))
    }

    /// Open a request for a replacement code.
    ///
    /// `None` unless the session is waiting for a code, idle, and the
    /// cooldown has run out.
    pub fn begin_resend(&mut self) -> Option<CodeRequest> {
        let remaining = self.cooldown_seconds_remaining();
        if self.stage != Stage::AwaitingCode || self.is_busy() || remaining > 0 {
            debug!(session_id = %self.id, remaining, "resend ignored");
            return None;
        }

        let mobile = self.mobile.clone()?;
        let ticket = self.open_ticket(RequestKind::Resend);
        Some(CodeRequest { ticket, mobile })
    }

    /// Apply an issued code: move to `AwaitingCode`, clear the entry and
    /// restart the cooldown.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime (see [`Countdown::start`]).
    pub fn complete_code_request(&mut self, request: CodeRequest, code: OneTimeCode) -> Completion {
        if !self.close_ticket(&request.ticket) {
            debug!(session_id = %self.id, "stale code discarded");
            return Completion::Discarded;
        }

        self.stage = Stage::AwaitingCode;
        self.mobile = Some(request.mobile.clone());
        self.issued_code = Some(code);
        self.entry.clear();
        self.last_error = None;
        self.failed_attempts = 0;
        self.restart_countdown();

        info!(
            session_id = %self.id,
            mobile_hash = %request.mobile.hashed(),
            resend = request.is_resend(),
            cooldown_secs = self.resend_cooldown_secs,
            "otp issued"
        );
        Completion::Applied
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Open a verification request for the entered code.
    ///
    /// Fails with `IncompleteCode` while any slot is empty; no comparison is
    /// made in that case.
    pub fn begin_verification(&mut self) -> Result<Option<VerifyRequest>, AuthError> {
        if self.stage != Stage::AwaitingCode || self.is_busy() {
            debug!(session_id = %self.id, stage = ?self.stage, "verification ignored");
            return Ok(None);
        }

        let Some(entered) = self.entry.joined() else {
            return Err(self.record(AuthError::IncompleteCode));
        };
        let Some(mobile) = self.mobile.clone() else {
            return Ok(None);
        };

        self.last_error = None;
        let ticket = self.open_ticket(RequestKind::Verify);
        Ok(Some(VerifyRequest {
            ticket,
            mobile,
            entered,
        }))
    }

    /// Compare the submitted code with the issued one.
    ///
    /// Digits are left in place on a mismatch.
    pub fn complete_verification(
        &mut self,
        request: VerifyRequest,
    ) -> Result<Completion, AuthError> {
        if !self.close_ticket(&request.ticket) {
            debug!(session_id = %self.id, "stale verification discarded");
            return Ok(Completion::Discarded);
        }

        let matched = self
            .issued_code
            .as_ref()
            .is_some_and(|code| code.matches(&request.entered));

        if !matched {
            self.failed_attempts += 1;
            return Err(self.record(AuthError::IncorrectCode));
        }

        self.stage = Stage::Verified;
        self.last_error = None;
        self.stop_countdown();
        info!(
            session_id = %self.id,
            mobile_hash = %request.mobile.hashed(),
            "otp verified"
        );
        Ok(Completion::Applied)
    }

    /// Record a failed round trip. Stale tickets leave the session untouched.
    pub fn fail_request(&mut self, ticket: &Ticket, err: AuthError) -> AuthError {
        if self.close_ticket(ticket) {
            self.record(err)
        } else {
            err
        }
    }

    /// Give up on an outstanding request, e.g. when its future was dropped.
    pub fn abandon(&mut self, ticket: &Ticket) {
        if self.close_ticket(ticket) {
            debug!(session_id = %self.id, kind = ?ticket.kind, "request abandoned");
        }
    }

    // =========================================================================
    // Code entry
    // =========================================================================

    fn accepts_entry(&self) -> bool {
        self.stage == Stage::AwaitingCode && !self.is_busy()
    }

    pub fn enter_digit(&mut self, index: usize, value: &str) -> bool {
        self.accepts_entry() && self.entry.enter_digit(index, value)
    }

    pub fn backspace(&mut self, index: usize) {
        if self.accepts_entry() {
            self.entry.backspace(index);
        }
    }

    pub fn navigate(&mut self, index: usize, direction: Direction) {
        if self.accepts_entry() {
            self.entry.navigate(index, direction);
        }
    }

    pub fn paste(&mut self, index: usize, text: &str) -> usize {
        if self.accepts_entry() {
            self.entry.paste(index, text)
        } else {
            0
        }
    }

    // =========================================================================
    // Change number
    // =========================================================================

    /// Back to the mobile field from any stage.
    ///
    /// The typed number is kept for re-editing; everything tied to the old
    /// number is dropped, including any outstanding request.
    pub fn change_mobile_number(&mut self) {
        if let Some(id) = self.in_flight.take() {
            debug!(session_id = %self.id, ticket = id, "outstanding request dropped");
        }
        self.stop_countdown();
        self.stage = Stage::AwaitingMobile;
        self.mobile = None;
        self.issued_code = None;
        self.entry.clear();
        self.last_error = None;
        self.failed_attempts = 0;
        info!(session_id = %self.id, "mobile number change requested");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&mut self, err: AuthError) -> AuthError {
        warn!(session_id = %self.id, error = %err, "login step failed");
        self.last_error = Some(err.to_string());
        err
    }

    fn open_ticket(&mut self, kind: RequestKind) -> Ticket {
        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        Ticket {
            id: self.next_ticket,
            kind,
        }
    }

    fn close_ticket(&mut self, ticket: &Ticket) -> bool {
        if self.in_flight == Some(ticket.id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn restart_countdown(&mut self) {
        self.stop_countdown();
        self.countdown = Some(Countdown::start(self.resend_cooldown_secs));
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }
}
