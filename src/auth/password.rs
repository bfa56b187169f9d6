use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Hash with an explicit cost. Seeding and tests use a low cost to stay fast.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, BcryptError> {
    verify(password, password_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hashed = hash_password_with_cost("password123", 4).unwrap();
        assert!(verify_password("password123", &hashed).unwrap());
        assert!(!verify_password("password124", &hashed).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("password123", "not-a-hash").is_err());
    }
}
