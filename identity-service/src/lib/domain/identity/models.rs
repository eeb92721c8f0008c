use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityIdError;

/// Identity aggregate entity.
///
/// Registered credential: normalized email plus password hash. Never holds a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Normalized email address.
///
/// Trimmed and lower-cased before validation, so the store's uniqueness
/// constraint and its lookups always see the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub const MAX_LENGTH: usize = 255;

    /// Normalize and validate a raw email address.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - More than 255 characters
    /// * `InvalidFormat` - Not a bare `local@domain.tld` address (display names and
    ///   domain literals are rejected)
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let normalized = email.as_ref().trim().to_lowercase();

        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }

        let length = normalized.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        // Bare mailbox only: a display name or bracketed form would be a second key for it
        let options = email_address::Options::default()
            .without_display_text()
            .without_domain_literal()
            .with_required_tld();

        email_address::EmailAddress::parse_with_options(&normalized, options)
            .map(|parsed| EmailAddress(parsed.email()))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Refresh token record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persisted refresh token. Holds only the digest of the token, never the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: RefreshTokenId,
    pub identity_id: IdentityId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Credentials handed to the client after register, login or refresh.
///
/// `refresh_token` is the only copy of the plaintext; it cannot be retrieved again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

/// Command to register a new identity
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Command to log in with email and password
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
