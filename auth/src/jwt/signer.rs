use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;

use super::claims::AccessClaims;
use super::errors::JwtError;
use super::verifier::RemoteVerifier;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Issues and verifies short-lived access tokens.
///
/// Uses HS256 (HMAC with SHA-256) over header and payload with a server-held secret
/// shared by every verifying service.
///
/// # Security Notes
/// - The secret should be at least 256 bits (32 bytes) for HS256
/// - Rotating the secret invalidates every outstanding access token
pub struct TokenSigner {
    encoding_key: EncodingKey,
    verifier: RemoteVerifier,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a new token signer.
    ///
    /// # Arguments
    /// * `secret` - Shared secret for signing tokens
    /// * `ttl` - Lifetime of issued tokens
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            verifier: RemoteVerifier::new(secret),
            ttl,
        }
    }

    /// Issue a signed token for a subject.
    ///
    /// `nbf` equals `iat`; `exp` is `iat` plus the configured lifetime.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        let claims = AccessClaims::new(subject, Utc::now(), self.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its subject.
    ///
    /// Expiry is always read from the token itself, never from the configured lifetime.
    ///
    /// # Errors
    /// * `Invalid` - Signature mismatch, malformed, expired, or not yet valid
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        self.verifier.verify(token)
    }

    /// Configured lifetime in seconds, for response payloads only.
    pub fn expiry_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Verification-only counterpart sharing this signer's secret.
    pub fn verifier(&self) -> RemoteVerifier {
        self.verifier.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));

        let token = signer.issue("user123").expect("Failed to issue token");
        assert!(!token.is_empty());
        assert_eq!(token.split('.').count(), 3);

        assert_eq!(signer.verify(&token), Ok("user123".to_string()));
    }

    #[test]
    fn test_verify_invalid_token() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));

        assert_eq!(signer.verify("invalid.token.here"), Err(JwtError::Invalid));
        assert_eq!(signer.verify(""), Err(JwtError::Invalid));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let signer = TokenSigner::new(SECRET, Duration::milliseconds(1));

        let token = signer.issue("user-1").expect("Failed to issue token");
        thread::sleep(std::time::Duration::from_millis(5));

        assert_eq!(signer.verify(&token), Err(JwtError::Invalid));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        let token = signer.issue("user123").expect("Failed to issue token");

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_signer = TokenSigner::new(b"another_secret_at_least_32_bytes!!", Duration::hours(1));
        let forged = forged_signer.issue("admin").expect("Failed to issue token");
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        assert_eq!(signer.verify(&parts.join(".")), Err(JwtError::Invalid));
    }

    #[test]
    fn test_expiry_seconds() {
        let signer = TokenSigner::new(SECRET, Duration::hours(DEFAULT_ACCESS_TOKEN_TTL_HOURS));
        assert_eq!(signer.expiry_seconds(), 86_400);
    }
}
