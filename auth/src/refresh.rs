use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// Random bytes in a refresh token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Opaque refresh token in plaintext.
///
/// Exists only between issuance and the response to the client, or between
/// receiving a presented token and hashing it. Only `digest()` may be persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Generate a fresh token from the OS random source, hex-encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a token presented by a client.
    pub fn presented(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// One-way digest stored in place of the token.
    pub fn digest(&self) -> String {
        digest_refresh_token(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

/// SHA-256 of a refresh token, hex-encoded (64 characters).
///
/// Unsalted and fast: the token already carries 256 bits of entropy.
pub fn digest_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
