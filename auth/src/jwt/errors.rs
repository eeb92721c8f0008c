use thiserror::Error;

/// Error type for JWT operations.
///
/// Every verification failure (bad signature, malformed structure, expired,
/// not yet valid) is reported as the same `Invalid` value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid token")]
    Invalid,
}
