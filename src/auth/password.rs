//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant with default parameters. Hashes are stored
//! as PHC strings, so the salt and parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::CadenceError;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, CadenceError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CadenceError::Auth(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CadenceError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| CadenceError::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "password123";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password("repeat-after-me").unwrap();
        let hash2 = hash_password("repeat-after-me").unwrap();

        // Different salts, both valid
        assert_ne!(hash1, hash2);
        assert!(verify_password("repeat-after-me", &hash1).unwrap());
        assert!(verify_password("repeat-after-me", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password123", "plainly-not-a-phc-string").is_err());
    }
}
