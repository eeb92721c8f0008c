pub mod identity;
pub mod refresh_token;

pub use identity::PostgresCredentialStore;
pub use refresh_token::PostgresRefreshTokenStore;
