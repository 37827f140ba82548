use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Argon2id with the crate's default cost parameters and a fresh salt per call.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: &str) -> Result<String, PasswordError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let (plain, hash) = (plain.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
}
