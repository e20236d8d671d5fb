/// Password hashing and verification using Argon2id
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password into a PHC-formatted Argon2id string
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(AppError::ValidationError("password is required".into()));
    }

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its PHC hash
///
/// Returns `Ok(false)` on a mismatch; malformed hashes are internal errors.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Run `verify_password` on the blocking pool; Argon2 is deliberately slow.
pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("foobar").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("foobar", &hash).unwrap());
        assert!(!verify_password("barfoo", &hash).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(
            hash_password(""),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn malformed_hash_is_internal_error() {
        assert!(matches!(
            verify_password("foobar", "md5:abc"),
            Err(AppError::Internal(_))
        ));
    }
}
