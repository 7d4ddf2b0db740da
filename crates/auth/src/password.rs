//! bcrypt password hashing.
//!
//! Hashing is CPU-bound; async callers should run it on a blocking thread.

use thiserror::Error;

use schelper_core::Password;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("bcrypt cost {0} out of range ({MIN_COST}..={MAX_COST})")]
    InvalidCost(u32),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &Password) -> Result<String, PasswordError> {
        bcrypt::hash(password.expose(), self.cost).map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Returns `false` for a wrong password and for a hash that cannot be parsed.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match bcrypt::verify(plain, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash could not be verified");
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::new(MIN_COST).unwrap();
        let pw = Password::parse("password123").unwrap();
        let hash = hasher.hash(&pw).unwrap();

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("password123", &hash));
        assert!(!hasher.verify("password124", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hasher = PasswordHasher::new(MIN_COST).unwrap();
        assert!(!hasher.verify("password123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn cost_is_range_checked() {
        assert_eq!(PasswordHasher::new(3), Err(PasswordError::InvalidCost(3)));
        assert_eq!(PasswordHasher::new(32), Err(PasswordError::InvalidCost(32)));
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
