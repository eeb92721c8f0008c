//! Credential primitives shared by every service in the deployment
//!
//! - Password policy and hashing (Argon2id)
//! - Access token issuance (HS256) and local verification
//! - Refresh token generation and digesting
//! - Authentication coordination
//!
//! The issuing service uses [`Authenticator`]; every other service only needs a
//! [`RemoteVerifier`] built from the same shared secret.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password1").unwrap();
//! assert!(hasher.verify("my_password1", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{RemoteVerifier, TokenSigner};
//! use chrono::Duration;
//!
//! let signer = TokenSigner::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(24));
//! let token = signer.issue("user123").unwrap();
//!
//! // Any other service, same secret, no network call
//! let verifier = RemoteVerifier::new(b"secret_key_at_least_32_bytes_long!");
//! assert_eq!(verifier.verify(&token).unwrap(), "user123");
//! ```
//!
//! ## Refresh Tokens
//! ```
//! use auth::RefreshToken;
//!
//! let token = RefreshToken::generate();
//! let stored = token.digest(); // persist this, hand `token` to the client
//! assert_eq!(RefreshToken::presented(token.as_str()).digest(), stored);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod refresh;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::AccessClaims;
pub use jwt::DEFAULT_ACCESS_TOKEN_TTL_HOURS;
pub use jwt::JwtError;
pub use jwt::RemoteVerifier;
pub use jwt::TokenSigner;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use password::PasswordPolicyError;
pub use refresh::digest_refresh_token;
pub use refresh::RefreshToken;
