//! Password hashing
//!
//! User passwords are stored as bcrypt hash strings, never in plain text.

use crate::error::{Error, Result};

/// bcrypt cost used when none is configured
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Lowest cost bcrypt accepts; only suitable for tests
pub const MIN_COST: u32 = 4;

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| Error::InvalidOperation(format!("password hashing failed: {}", e)))
}

/// Check a candidate password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| Error::Corruption(format!("unreadable password hash: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2", MIN_COST).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same", MIN_COST).unwrap();
        let b = hash_password("same", MIN_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(hash_password("pw", 2).is_err());
    }

    #[test]
    fn test_garbage_hash_is_corruption() {
        let err = verify_password("pw", "not-a-hash").unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }
}
