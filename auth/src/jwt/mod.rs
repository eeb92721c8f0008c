pub mod claims;
pub mod errors;
pub mod signer;
pub mod verifier;

pub use claims::AccessClaims;
pub use errors::JwtError;
pub use signer::TokenSigner;
pub use signer::DEFAULT_ACCESS_TOKEN_TTL_HOURS;
pub use verifier::RemoteVerifier;
