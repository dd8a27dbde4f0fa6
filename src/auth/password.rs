//! Password hashing via bcrypt.

/// Hash a password for storage
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the test suite fast
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_verifies_and_rejects() {
        let hash = hash_password("correct horse battery staple", TEST_COST).unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("Tr0ub4dor&3", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password", TEST_COST).unwrap();
        let b = hash_password("same-password", TEST_COST).unwrap();
        assert_ne!(a, b);
    }
}
