use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;

use super::claims::AccessClaims;
use super::errors::JwtError;

const BEARER_SCHEME: &str = "Bearer";

/// Verification half of the access token scheme.
///
/// Every service in the deployment holds one of these, built from the same shared
/// secret as the issuing service. Verification is purely local: no network call.
#[derive(Clone)]
pub struct RemoteVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl RemoteVerifier {
    /// Create a verifier for tokens signed with `secret` (HS256).
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    /// * `Invalid` - Signature mismatch, malformed, expired, or not yet valid
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| JwtError::Invalid)?;

        // jsonwebtoken compares whole seconds; recheck at millisecond resolution
        let now = Utc::now();
        if claims.is_expired(now) || claims.is_not_yet_valid(now) || claims.sub.is_empty() {
            return Err(JwtError::Invalid);
        }

        Ok(claims.sub)
    }

    /// Verify the value of an `Authorization: Bearer <token>` header.
    ///
    /// # Errors
    /// * `Invalid` - Header is not a bearer credential, or the token fails verification
    pub fn verify_bearer(&self, authorization: &str) -> Result<String, JwtError> {
        let (scheme, token) = authorization
            .trim()
            .split_once(' ')
            .ok_or(JwtError::Invalid)?;

        // Auth schemes are case-insensitive
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
            return Err(JwtError::Invalid);
        }

        self.verify(token)
    }
}
