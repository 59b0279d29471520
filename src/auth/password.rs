//! Argon2id password hashing and verification.

use crate::error::AppError;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// Returns the PHC string (`$argon2id$...`), which embeds the salt and
/// parameters needed for later verification.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored PHC hash string.
///
/// A mismatch is not an error: it returns `Ok(false)`. Only a malformed
/// stored hash is an error. Comparison is constant-time inside argon2.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}
