use super::errors::PasswordPolicyError;

/// Credential rules applied before a password is ever hashed.
///
/// Rules run in a fixed order: length bounds, then letter, then digit.
/// The upper bound is a hard rejection; passwords are never truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
}

impl PasswordPolicy {
    pub const MIN_LENGTH: usize = 8;
    pub const MAX_LENGTH: usize = 72;

    /// Create the default policy (8 to 72 characters, at least one letter and one digit).
    pub fn new() -> Self {
        Self {
            min_length: Self::MIN_LENGTH,
            max_length: Self::MAX_LENGTH,
        }
    }

    /// Check a plaintext password against the policy.
    ///
    /// # Errors
    /// * `TooShort` / `TooLong` - Character count outside the allowed range
    /// * `MissingLetter` - No alphabetic character
    /// * `MissingDigit` - No numeric character
    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min: self.min_length,
                actual: length,
            });
        }
        if length > self.max_length {
            return Err(PasswordPolicyError::TooLong {
                max: self.max_length,
                actual: length,
            });
        }

        if !password.chars().any(char::is_alphabetic) {
            return Err(PasswordPolicyError::MissingLetter);
        }
        if !password.chars().any(char::is_numeric) {
            return Err(PasswordPolicyError::MissingDigit);
        }

        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new()
    }
}
