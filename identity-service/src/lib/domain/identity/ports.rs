use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::identity::errors::AuthError;
use crate::identity::errors::CredentialStoreError;
use crate::identity::errors::RefreshTokenStoreError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginCommand;
use crate::identity::models::RefreshTokenId;
use crate::identity::models::RefreshTokenRecord;
use crate::identity::models::RegisterCommand;
use crate::identity::models::TokenPair;

/// Port for credential lifecycle operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity and open its first session.
    ///
    /// # Returns
    /// Created identity with a fresh token pair
    ///
    /// # Errors
    /// * `InvalidEmail` - Email is not a valid address
    /// * `WeakCredential` - Password violates the policy
    /// * `EmailConflict` - Normalized email is already registered
    /// * `Unavailable` - Store unreachable; the identity may already exist
    async fn register(&self, command: RegisterCommand) -> Result<(Identity, TokenPair), AuthError>;

    /// Exchange email and password for a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, malformed email, or wrong password
    /// * `Unavailable` - Store unreachable
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError>;

    /// Rotate a refresh token into a new token pair.
    ///
    /// The presented token is consumed: a second call with it fails.
    ///
    /// # Errors
    /// * `InvalidRefresh` - Empty, unknown, expired or already rotated token
    /// * `Unavailable` - Store unreachable
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Delete the session behind a refresh token. Unknown tokens are ignored.
    ///
    /// # Errors
    /// * `Unavailable` - Store unreachable
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Retrieve an identity by identifier.
    ///
    /// # Errors
    /// * `IdentityNotFound` - Identity does not exist
    /// * `Unavailable` - Store unreachable
    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, AuthError>;

    /// Remove expired refresh tokens.
    ///
    /// # Returns
    /// Number of records removed
    async fn sweep_expired_refresh_tokens(&self) -> Result<u64, AuthError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), AuthError>;
}

/// Persistence operations for identities.
///
/// Emails arrive already normalized; the store compares them verbatim.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `EmailTaken` - Uniqueness constraint on the email was violated
    /// * `Unavailable` - Database operation failed
    async fn create(&self, identity: Identity) -> Result<Identity, CredentialStoreError>;

    /// Retrieve identity by normalized email.
    ///
    /// # Errors
    /// * `NotFound` - No identity with this email
    /// * `Unavailable` - Database operation failed
    async fn get_by_email(&self, email: &EmailAddress) -> Result<Identity, CredentialStoreError>;

    /// Retrieve identity by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Unavailable` - Database operation failed
    async fn get_by_id(&self, id: &IdentityId) -> Result<Identity, CredentialStoreError>;

    /// Round trip to the backing store.
    async fn ping(&self) -> Result<(), CredentialStoreError>;
}

/// Persistence operations for refresh token digests.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Persist the digest of a newly issued refresh token.
    ///
    /// # Errors
    /// * `Unavailable` - Database operation failed
    async fn create(
        &self,
        identity_id: &IdentityId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError>;

    /// Retrieve an unexpired record by digest.
    ///
    /// Expired rows are reported as `NotFound`.
    async fn get_by_hash(&self, token_hash: &str)
        -> Result<RefreshTokenRecord, RefreshTokenStoreError>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<(), RefreshTokenStoreError>;

    /// Delete every expired record.
    ///
    /// # Returns
    /// Number of records removed
    async fn delete_expired(&self) -> Result<u64, RefreshTokenStoreError>;

    /// Atomically delete and return the unexpired record with this digest.
    ///
    /// Of any number of concurrent callers presenting the same digest, at most one
    /// receives the record.
    ///
    /// # Errors
    /// * `NotFound` - No unexpired record, or another caller consumed it first
    /// * `Unavailable` - Database operation failed
    async fn consume(&self, token_hash: &str)
        -> Result<RefreshTokenRecord, RefreshTokenStoreError>;
}
