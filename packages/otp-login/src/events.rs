use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::MobileNumber;

/// Where the surrounding application sends a verified user
pub const LANDING_ROUTE: &str = "/user/dashboard";

/// Login events - facts about a login attempt
///
/// Errors go in `Result::Err`, not in events, except for failed verification
/// which the application may want to count.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoginEvent {
    /// A first code was issued for the number
    CodeSent {
        session_id: Uuid,
        masked_mobile: String,
        cooldown_secs: u32,
    },

    /// A replacement code was issued after the cooldown
    CodeResent {
        session_id: Uuid,
        masked_mobile: String,
        cooldown_secs: u32,
    },

    /// The submitted code did not match
    VerificationFailed {
        session_id: Uuid,
        failed_attempts: u32,
    },

    /// Terminal success signal
    Verified {
        session_id: Uuid,
        mobile: MobileNumber,
        verified_at: DateTime<Utc>,
        landing_route: String,
    },

    /// The user went back to change the number
    NumberChanged { session_id: Uuid },
}
