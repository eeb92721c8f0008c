use auth::PasswordPolicyError;
use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Empty,

    #[error("Email too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Failures reported by the identity store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialStoreError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Identity not found")]
    NotFound,

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored identity is invalid: {0}")]
    InvalidRecord(String),
}

/// Failures reported by the refresh token store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshTokenStoreError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for register, login and refresh.
///
/// `InvalidCredentials` and `InvalidRefresh` never carry a reason. `Unavailable`
/// and `Internal` carry details for the server log only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    WeakCredential(#[from] PasswordPolicyError),

    #[error("Email already registered")]
    EmailConflict,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidRefresh,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CredentialStoreError> for AuthError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::EmailTaken => AuthError::EmailConflict,
            CredentialStoreError::NotFound => AuthError::IdentityNotFound,
            CredentialStoreError::Unavailable(msg) => AuthError::Unavailable(msg),
            CredentialStoreError::InvalidRecord(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<RefreshTokenStoreError> for AuthError {
    fn from(err: RefreshTokenStoreError) -> Self {
        match err {
            RefreshTokenStoreError::NotFound => AuthError::InvalidRefresh,
            RefreshTokenStoreError::Unavailable(msg) => AuthError::Unavailable(msg),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        match err {
            auth::PasswordError::Policy(policy) => AuthError::WeakCredential(policy),
            auth::PasswordError::HashingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
