use thiserror::Error;

/// Reasons a candidate password is rejected by the policy.
///
/// Messages are safe to show to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Password must contain at least one letter")]
    MissingLetter,

    #[error("Password must contain at least one digit")]
    MissingDigit,
}

/// Error type for password operations.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("{0}")]
    Policy(#[from] PasswordPolicyError),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
