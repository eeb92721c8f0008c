use chrono::Duration;

use crate::jwt::JwtError;
use crate::jwt::RemoteVerifier;
use crate::jwt::TokenSigner;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::PasswordPolicyError;

/// Authentication coordinator combining password policy, hashing and token signing.
///
/// Provides the credential operations an issuing service needs in one place.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_signer: TokenSigner,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `access_token_ttl` - Lifetime of issued access tokens
    ///
    /// # Returns
    /// Configured Authenticator instance
    pub fn new(jwt_secret: &[u8], access_token_ttl: Duration) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_signer: TokenSigner::new(jwt_secret, access_token_ttl),
        }
    }

    /// Check a password against the policy without hashing it.
    pub fn validate_password(&self, password: &str) -> Result<(), PasswordPolicyError> {
        self.password_hasher.policy().validate(password)
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `Policy` - Password violates the policy
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Compare a password with a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue an access token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<String, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_signer.issue(subject)?)
    }

    /// Issue an access token without password verification.
    ///
    /// Used by refresh flows, where the refresh token already proved the identity.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, JwtError> {
        self.token_signer.issue(subject)
    }

    /// Validate an access token and return its subject.
    pub fn validate_token(&self, token: &str) -> Result<String, JwtError> {
        self.token_signer.verify(token)
    }

    /// Access token lifetime in seconds.
    pub fn expiry_seconds(&self) -> i64 {
        self.token_signer.expiry_seconds()
    }

    /// Verification-only handle for request middleware.
    pub fn verifier(&self) -> RemoteVerifier {
        self.token_signer.verifier()
    }
}
