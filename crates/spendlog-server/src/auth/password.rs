use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{AppError, AppResult};

/// Hash a password with a fresh random salt, producing a PHC string.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Constant-time verification against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("secret-password").expect("hash");
        assert!(verify_password("secret-password", &hash).expect("verify"));
        assert!(!verify_password("wrong-password", &hash).expect("verify"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("secret-password").expect("hash");
        let b = hash_password("secret-password").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_an_internal_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
