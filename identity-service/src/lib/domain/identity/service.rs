use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::RefreshToken;
use chrono::Duration;
use chrono::Utc;

use crate::identity::errors::AuthError;
use crate::identity::errors::CredentialStoreError;
use crate::identity::errors::RefreshTokenStoreError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginCommand;
use crate::identity::models::RegisterCommand;
use crate::identity::models::TokenPair;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::identity::ports::RefreshTokenStore;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_HOURS: i64 = 7 * 24;

/// Password hashed once and checked against when a login email is unknown,
/// so both failure paths cost one password verification.
const DECOY_PASSWORD: &str = "decoy-password-0";

/// Domain service implementation for credential lifecycle operations.
///
/// Sessions exist only as refresh token records; there is no other server-side state.
pub struct AuthService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    credentials: Arc<CS>,
    refresh_tokens: Arc<RS>,
    authenticator: Arc<Authenticator>,
    refresh_token_ttl: Duration,
    decoy_hash: OnceLock<String>,
}

impl<CS, RS> AuthService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `credentials` - Identity persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `authenticator` - Password hashing and access token signing
    /// * `refresh_token_ttl` - Lifetime of issued refresh tokens
    pub fn new(
        credentials: Arc<CS>,
        refresh_tokens: Arc<RS>,
        authenticator: Arc<Authenticator>,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens,
            authenticator,
            refresh_token_ttl,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Sign an access token and open a session for the identity.
    async fn issue(&self, identity_id: &IdentityId) -> Result<TokenPair, AuthError> {
        let access_token = self
            .authenticator
            .issue_access_token(&identity_id.to_string())?;

        self.open_session(identity_id, access_token).await
    }

    /// Persist a fresh refresh token digest and pair it with `access_token`.
    ///
    /// The only place a plaintext refresh token is created.
    async fn open_session(
        &self,
        identity_id: &IdentityId,
        access_token: String,
    ) -> Result<TokenPair, AuthError> {
        let refresh_token = RefreshToken::generate();
        let expires_at = Utc::now() + self.refresh_token_ttl;

        let record = self
            .refresh_tokens
            .create(identity_id, &refresh_token.digest(), expires_at)
            .await?;

        tracing::debug!(
            identity_id = %identity_id,
            refresh_token_id = %record.id,
            expires_at = %record.expires_at,
            "Session opened"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.into_inner(),
            expires_in: self.authenticator.expiry_seconds(),
        })
    }

    fn burn_password_check(&self, password: &str) {
        let decoy_hash = self.decoy_hash.get_or_init(|| {
            self.authenticator
                .hash_password(DECOY_PASSWORD)
                .unwrap_or_default()
        });
        let _ = self.authenticator.verify_password(password, decoy_hash);
    }
}

#[async_trait]
impl<CS, RS> AuthServicePort for AuthService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<(Identity, TokenPair), AuthError> {
        let email = EmailAddress::new(&command.email)?;
        self.authenticator.validate_password(&command.password)?;
        let password_hash = self.authenticator.hash_password(&command.password)?;

        let identity = Identity {
            id: IdentityId::new(),
            email,
            password_hash,
            created_at: Utc::now(),
        };

        let identity = self.credentials.create(identity).await?;
        tracing::info!(identity_id = %identity.id, "Identity registered");

        // The identity stays even if no session can be opened; it can log in later
        let tokens = self.issue(&identity.id).await.map_err(|e| {
            tracing::error!(
                identity_id = %identity.id,
                error = %e,
                "Token issuance failed after registration"
            );
            e
        })?;

        Ok((identity, tokens))
    }

    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError> {
        let email =
            EmailAddress::new(&command.email).map_err(|_| AuthError::InvalidCredentials)?;

        let identity = match self.credentials.get_by_email(&email).await {
            Ok(identity) => identity,
            Err(CredentialStoreError::NotFound) => {
                self.burn_password_check(&command.password);
                tracing::info!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let access_token = self
            .authenticator
            .authenticate(
                &command.password,
                &identity.password_hash,
                &identity.id.to_string(),
            )
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::info!(identity_id = %identity.id, "Login rejected");
                    AuthError::InvalidCredentials
                }
                AuthenticationError::JwtError(err) => err.into(),
            })?;

        tracing::info!(identity_id = %identity.id, "Login succeeded");
        self.open_session(&identity.id, access_token).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidRefresh);
        }

        let presented = RefreshToken::presented(refresh_token);
        let record = self.refresh_tokens.consume(&presented.digest()).await?;

        tracing::info!(
            identity_id = %record.identity_id,
            refresh_token_id = %record.id,
            "Refresh token rotated"
        );

        self.issue(&record.identity_id).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Ok(());
        }

        let presented = RefreshToken::presented(refresh_token);
        match self.refresh_tokens.get_by_hash(&presented.digest()).await {
            Ok(record) => {
                self.refresh_tokens.delete_by_id(&record.id).await?;
                tracing::info!(
                    identity_id = %record.identity_id,
                    refresh_token_id = %record.id,
                    "Session closed"
                );
                Ok(())
            }
            Err(RefreshTokenStoreError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, AuthError> {
        Ok(self.credentials.get_by_id(id).await?)
    }

    async fn sweep_expired_refresh_tokens(&self) -> Result<u64, AuthError> {
        let removed = self.refresh_tokens.delete_expired().await?;
        tracing::info!(removed, "Expired refresh tokens swept");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), AuthError> {
        Ok(self.credentials.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::DateTime;
    use mockall::mock;

    use super::*;
    use crate::identity::models::RefreshTokenId;
    use crate::identity::models::RefreshTokenRecord;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn create(&self, identity: Identity) -> Result<Identity, CredentialStoreError>;
            async fn get_by_email(&self, email: &EmailAddress) -> Result<Identity, CredentialStoreError>;
            async fn get_by_id(&self, id: &IdentityId) -> Result<Identity, CredentialStoreError>;
            async fn ping(&self) -> Result<(), CredentialStoreError>;
        }
    }

    mock! {
        pub TestRefreshTokenStore {}

        #[async_trait]
        impl RefreshTokenStore for TestRefreshTokenStore {
            async fn create(&self, identity_id: &IdentityId, token_hash: &str, expires_at: DateTime<Utc>) -> Result<RefreshTokenRecord, RefreshTokenStoreError>;
            async fn get_by_hash(&self, token_hash: &str) -> Result<RefreshTokenRecord, RefreshTokenStoreError>;
            async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<(), RefreshTokenStoreError>;
            async fn delete_expired(&self) -> Result<u64, RefreshTokenStoreError>;
            async fn consume(&self, token_hash: &str) -> Result<RefreshTokenRecord, RefreshTokenStoreError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(SECRET, Duration::hours(24)))
    }

    fn service(
        credentials: MockTestCredentialStore,
        refresh_tokens: MockTestRefreshTokenStore,
    ) -> AuthService<MockTestCredentialStore, MockTestRefreshTokenStore> {
        AuthService::new(
            Arc::new(credentials),
            Arc::new(refresh_tokens),
            authenticator(),
            Duration::hours(DEFAULT_REFRESH_TOKEN_TTL_HOURS),
        )
    }

    fn record(identity_id: &IdentityId, token_hash: &str, expires_at: DateTime<Utc>) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: RefreshTokenId::new(),
            identity_id: *identity_id,
            token_hash: token_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Refresh token store backed by a shared map, keyed by digest.
    fn stateful_refresh_tokens(
        rows: Arc<Mutex<HashMap<String, RefreshTokenRecord>>>,
    ) -> MockTestRefreshTokenStore {
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        let created = Arc::clone(&rows);
        refresh_tokens
            .expect_create()
            .returning(move |identity_id, token_hash, expires_at| {
                let row = record(identity_id, token_hash, expires_at);
                created
                    .lock()
                    .unwrap()
                    .insert(token_hash.to_string(), row.clone());
                Ok(row)
            });

        let consumed = Arc::clone(&rows);
        refresh_tokens.expect_consume().returning(move |token_hash| {
            consumed
                .lock()
                .unwrap()
                .remove(token_hash)
                .filter(|row| row.expires_at > Utc::now())
                .ok_or(RefreshTokenStoreError::NotFound)
        });

        refresh_tokens
    }

    fn existing_identity(email: &str, password: &str) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: EmailAddress::new(email).unwrap(),
            password_hash: authenticator().hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut credentials = MockTestCredentialStore::new();
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        credentials
            .expect_create()
            .withf(|identity| {
                identity.email.as_str() == "alice@example.com"
                    && identity.password_hash.starts_with("$argon2id")
                    && identity.password_hash != "password123"
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let stored_hash = Arc::new(Mutex::new(String::new()));
        let captured = Arc::clone(&stored_hash);
        refresh_tokens
            .expect_create()
            .withf(|_, token_hash, expires_at| {
                token_hash.len() == 64 && *expires_at > Utc::now() + Duration::days(6)
            })
            .times(1)
            .returning(move |identity_id, token_hash, expires_at| {
                *captured.lock().unwrap() = token_hash.to_string();
                Ok(record(identity_id, token_hash, expires_at))
            });

        let service = service(credentials, refresh_tokens);

        let (identity, tokens) = service
            .register(RegisterCommand::new(" Alice@Example.com ", "password123"))
            .await
            .expect("Registration failed");

        assert_eq!(identity.email.as_str(), "alice@example.com");
        assert_eq!(tokens.expires_in, 24 * 60 * 60);
        assert_eq!(
            authenticator().validate_token(&tokens.access_token),
            Ok(identity.id.to_string())
        );

        // Only the digest reached the store
        let stored_hash = stored_hash.lock().unwrap().clone();
        assert_ne!(stored_hash, tokens.refresh_token);
        assert_eq!(auth::digest_refresh_token(&tokens.refresh_token), stored_hash);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut credentials = MockTestCredentialStore::new();
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        credentials
            .expect_create()
            .times(1)
            .returning(|_| Err(CredentialStoreError::EmailTaken));
        refresh_tokens.expect_create().times(0);

        let service = service(credentials, refresh_tokens);

        let result = service
            .register(RegisterCommand::new("alice@example.com", "password123"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::EmailConflict);
    }

    #[tokio::test]
    async fn test_register_same_mailbox_spelled_differently() {
        let taken: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut credentials = MockTestCredentialStore::new();

        let unique = Arc::clone(&taken);
        credentials.expect_create().returning(move |identity| {
            let mut taken = unique.lock().unwrap();
            if taken.iter().any(|email| email == identity.email.as_str()) {
                return Err(CredentialStoreError::EmailTaken);
            }
            taken.push(identity.email.as_str().to_string());
            Ok(identity)
        });

        let rows = Arc::new(Mutex::new(HashMap::new()));
        let service = service(credentials, stateful_refresh_tokens(rows));

        service
            .register(RegisterCommand::new("alice@example.com", "password123"))
            .await
            .expect("Registration failed");

        let result = service
            .register(RegisterCommand::new(" ALICE@Example.com ", "different456"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::EmailConflict);

        let result = service
            .register(RegisterCommand::new("Alice <alice@example.com>", "different456"))
            .await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidEmail(_)));

        assert_eq!(taken.lock().unwrap().as_slice(), ["alice@example.com"]);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let mut credentials = MockTestCredentialStore::new();
        credentials.expect_create().times(0);

        let service = service(credentials, MockTestRefreshTokenStore::new());

        let result = service
            .register(RegisterCommand::new("alice@example.com", "password"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            AuthError::WeakCredential(auth::PasswordPolicyError::MissingDigit)
        );
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let mut credentials = MockTestCredentialStore::new();
        credentials.expect_create().times(0);

        let service = service(credentials, MockTestRefreshTokenStore::new());

        let result = service
            .register(RegisterCommand::new("not-an-email", "password123"))
            .await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_register_keeps_identity_when_issuance_fails() {
        let mut credentials = MockTestCredentialStore::new();
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        credentials
            .expect_create()
            .times(1)
            .returning(|identity| Ok(identity));
        refresh_tokens
            .expect_create()
            .times(1)
            .returning(|_, _, _| Err(RefreshTokenStoreError::Unavailable("connection reset".into())));

        let service = service(credentials, refresh_tokens);

        let result = service
            .register(RegisterCommand::new("alice@example.com", "password123"))
            .await;
        assert!(matches!(result.unwrap_err(), AuthError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_register_then_login_is_case_insensitive() {
        let stored: Arc<Mutex<Option<Identity>>> = Arc::new(Mutex::new(None));
        let mut credentials = MockTestCredentialStore::new();

        let created = Arc::clone(&stored);
        credentials.expect_create().times(1).returning(move |identity| {
            *created.lock().unwrap() = Some(identity.clone());
            Ok(identity)
        });

        let found = Arc::clone(&stored);
        credentials
            .expect_get_by_email()
            .withf(|email| email.as_str() == "a@b.com")
            .times(1)
            .returning(move |_| {
                found
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or(CredentialStoreError::NotFound)
            });

        let rows = Arc::new(Mutex::new(HashMap::new()));
        let service = service(credentials, stateful_refresh_tokens(Arc::clone(&rows)));

        let (identity, _) = service
            .register(RegisterCommand::new("A@B.com", "password123"))
            .await
            .expect("Registration failed");

        let tokens = service
            .login(LoginCommand::new("a@b.com", "password123"))
            .await
            .expect("Login failed");

        assert_eq!(
            authenticator().validate_token(&tokens.access_token),
            Ok(identity.id.to_string())
        );
        assert_eq!(rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut credentials = MockTestCredentialStore::new();
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        credentials
            .expect_get_by_email()
            .times(1)
            .returning(|_| Err(CredentialStoreError::NotFound));
        refresh_tokens.expect_create().times(0);

        let service = service(credentials, refresh_tokens);

        let result = service
            .login(LoginCommand::new("nobody@example.com", "password123"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let identity = existing_identity("alice@example.com", "password123");
        let mut credentials = MockTestCredentialStore::new();
        let mut refresh_tokens = MockTestRefreshTokenStore::new();

        credentials
            .expect_get_by_email()
            .times(1)
            .returning(move |_| Ok(identity.clone()));
        refresh_tokens.expect_create().times(0);

        let service = service(credentials, refresh_tokens);

        let result = service
            .login(LoginCommand::new("alice@example.com", "password124"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_malformed_email_is_generic_failure() {
        let mut credentials = MockTestCredentialStore::new();
        credentials.expect_get_by_email().times(0);

        let service = service(credentials, MockTestRefreshTokenStore::new());

        let result = service
            .login(LoginCommand::new("not-an-email", "password123"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_store_unavailable() {
        let mut credentials = MockTestCredentialStore::new();
        credentials
            .expect_get_by_email()
            .times(1)
            .returning(|_| Err(CredentialStoreError::Unavailable("timeout".into())));

        let service = service(credentials, MockTestRefreshTokenStore::new());

        let result = service
            .login(LoginCommand::new("alice@example.com", "password123"))
            .await;
        assert!(matches!(result.unwrap_err(), AuthError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_once() {
        let identity = existing_identity("alice@example.com", "password123");
        let mut credentials = MockTestCredentialStore::new();
        credentials
            .expect_get_by_email()
            .returning(move |_| Ok(identity.clone()));

        let rows = Arc::new(Mutex::new(HashMap::new()));
        let service = service(credentials, stateful_refresh_tokens(Arc::clone(&rows)));

        let original = service
            .login(LoginCommand::new("alice@example.com", "password123"))
            .await
            .expect("Login failed");

        let rotated = service
            .refresh(&original.refresh_token)
            .await
            .expect("First refresh failed");
        assert_ne!(rotated.refresh_token, original.refresh_token);
        assert_eq!(rows.lock().unwrap().len(), 1);

        let replayed = service.refresh(&original.refresh_token).await;
        assert_eq!(replayed.unwrap_err(), AuthError::InvalidRefresh);

        // The replacement is still good
        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let identity_id = IdentityId::new();
        let token = RefreshToken::generate();

        let rows = Arc::new(Mutex::new(HashMap::new()));
        rows.lock().unwrap().insert(
            token.digest(),
            record(&identity_id, &token.digest(), Utc::now() - Duration::minutes(1)),
        );

        let service = service(
            MockTestCredentialStore::new(),
            stateful_refresh_tokens(Arc::clone(&rows)),
        );

        let result = service.refresh(token.as_str()).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidRefresh);
    }

    #[tokio::test]
    async fn test_refresh_empty_token() {
        let mut refresh_tokens = MockTestRefreshTokenStore::new();
        refresh_tokens.expect_consume().times(0);

        let service = service(MockTestCredentialStore::new(), refresh_tokens);

        assert_eq!(
            service.refresh("").await.unwrap_err(),
            AuthError::InvalidRefresh
        );
    }

    #[tokio::test]
    async fn test_refresh_store_unavailable() {
        let mut refresh_tokens = MockTestRefreshTokenStore::new();
        refresh_tokens
            .expect_consume()
            .times(1)
            .returning(|_| Err(RefreshTokenStoreError::Unavailable("timeout".into())));

        let service = service(MockTestCredentialStore::new(), refresh_tokens);

        let result = service.refresh(RefreshToken::generate().as_str()).await;
        assert!(matches!(result.unwrap_err(), AuthError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let identity_id = IdentityId::new();
        let token = RefreshToken::generate();
        let existing = record(&identity_id, &token.digest(), Utc::now() + Duration::days(1));
        let existing_id = existing.id;

        let mut refresh_tokens = MockTestRefreshTokenStore::new();
        let expected_hash = token.digest();
        refresh_tokens
            .expect_get_by_hash()
            .withf(move |token_hash| token_hash == expected_hash)
            .times(1)
            .returning(move |_| Ok(existing.clone()));
        refresh_tokens
            .expect_delete_by_id()
            .withf(move |id| *id == existing_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = service(MockTestCredentialStore::new(), refresh_tokens);

        assert!(service.logout(token.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_unknown_token_is_ok() {
        let mut refresh_tokens = MockTestRefreshTokenStore::new();
        refresh_tokens
            .expect_get_by_hash()
            .times(1)
            .returning(|_| Err(RefreshTokenStoreError::NotFound));
        refresh_tokens.expect_delete_by_id().times(0);

        let service = service(MockTestCredentialStore::new(), refresh_tokens);

        assert!(service.logout("deadbeef").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_identity_not_found() {
        let mut credentials = MockTestCredentialStore::new();
        credentials
            .expect_get_by_id()
            .times(1)
            .returning(|_| Err(CredentialStoreError::NotFound));

        let service = service(credentials, MockTestRefreshTokenStore::new());

        let result = service.get_identity(&IdentityId::new()).await;
        assert_eq!(result.unwrap_err(), AuthError::IdentityNotFound);
    }

    #[tokio::test]
    async fn test_sweep_expired_refresh_tokens() {
        let mut refresh_tokens = MockTestRefreshTokenStore::new();
        refresh_tokens
            .expect_delete_expired()
            .times(1)
            .returning(|| Ok(3));

        let service = service(MockTestCredentialStore::new(), refresh_tokens);

        assert_eq!(service.sweep_expired_refresh_tokens().await, Ok(3));
    }
}
