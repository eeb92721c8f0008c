use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;
use super::policy::PasswordPolicy;

/// Argon2id memory cost in KiB.
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Argon2id iteration count.
const TIME_COST: u32 = 2;
/// Argon2id lanes.
const PARALLELISM: u32 = 1;

/// Password hashing implementation.
///
/// Enforces the password policy, then hashes with Argon2id and a fresh random salt.
/// The cost parameters are deliberately slow; hashing stays on the request path.
pub struct PasswordHasher {
    policy: PasswordPolicy,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with the default policy
    pub fn new() -> Self {
        Self {
            policy: PasswordPolicy::new(),
        }
    }

    /// Policy applied before hashing.
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hash a plaintext password securely.
    ///
    /// Each call salts independently, so hashing the same input twice yields two
    /// different digests that both verify.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `Policy` - Password violates the policy
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.policy.validate(password)?;

        let salt = SaltString::generate(&mut OsRng);

        argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters and salt are read from the stored PHC string. A malformed
    /// stored hash never matches.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}
