use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// MobileNumber - a validated 10-digit mobile number
///
/// The leading digit must be 6, 7, 8 or 9. No country code, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub const LENGTH: usize = 10;

    /// Parse a candidate number exactly as typed.
    ///
    /// Input is not trimmed; callers that want to forgive stray whitespace
    /// should trim before calling.
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let bytes = input.as_bytes();
        let valid = bytes.len() == Self::LENGTH
            && matches!(bytes[0], b'6'..=b'9')
            && bytes.iter().all(u8::is_ascii_digit);

        if valid {
            Ok(Self(input.to_string()))
        } else {
            Err(AuthError::InvalidMobileFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number with all but the last four digits hidden, e.g. `******3210`
    pub fn masked(&self) -> String {
        let visible = &self.0[Self::LENGTH - 4..];
        format!("{}{}", "*".repeat(Self::LENGTH - 4), visible)
    }

    /// Hash used in place of the raw number in log fields
    pub fn hashed(&self) -> String {
        hash_mobile_number(&self.0)
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a mobile number using SHA256
///
/// Raw numbers never reach the logs; the hex digest is stable per number so
/// repeated attempts from the same number can still be correlated.
pub fn hash_mobile_number(mobile: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mobile.as_bytes());
    format!("{:x}", hasher.finalize())
}
