use std::fmt;

/// Number of digits in every issued code
pub const CODE_LENGTH: usize = 6;

const LOWEST: u32 = 100_000;
const HIGHEST: u32 = 999_999;

/// OneTimeCode - a six digit numeric code issued for one login attempt
///
/// `Debug` is redacted so codes never end up in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Draw a code uniformly from `100000..=999999` using the caller's RNG.
    ///
    /// Issued codes therefore never start with a zero.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::from_number(rng.u32(LOWEST..=HIGHEST))
    }

    /// Render `n` as six digits, zero padded.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{:0width$}", n % (HIGHEST + 1), width = CODE_LENGTH))
    }

    /// Build a code from a string of exactly six ASCII digits.
    pub fn from_digits(digits: &str) -> Option<Self> {
        (digits.len() == CODE_LENGTH && digits.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string comparison against the joined entry
    pub fn matches(&self, entered: &str) -> bool {
        self.0 == entered
    }
}

impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(******)")
    }
}
