use thiserror::Error;

/// Login flow errors
///
/// Every variant is recoverable: the session stays on its current stage and
/// the message is rendered inline next to the input that caused it.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a valid 10-digit mobile number")]
    InvalidMobileFormat,

    #[error("Please enter all 6 digits of the code")]
    IncompleteCode,

    #[error("The code you entered is incorrect")]
    IncorrectCode,

    #[error("Could not reach verification service: {0}")]
    Gateway(#[from] anyhow::Error),
}
