use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Access token payload.
///
/// Carries only the subject and the three RFC 7519 time claims. All timestamps
/// are Unix seconds; every claim is required when decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (identity identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp), equal to `iat`
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// Build claims for a subject issued at `now` and valid for `ttl`.
    ///
    /// Sub-second precision is truncated, so `exp` never lies after the true expiry.
    pub fn new(subject: impl ToString, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = now.timestamp();
        let expires_at = (now + ttl).timestamp();

        Self {
            sub: subject.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
        }
    }

    /// Check if the token is expired at the given instant.
    ///
    /// Compared in milliseconds: a token is expired once `now` has passed the
    /// start of its `exp` second.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.exp.saturating_mul(1000)
    }

    /// Check if the token may not be used yet at the given instant.
    pub fn is_not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.nbf
    }
}
