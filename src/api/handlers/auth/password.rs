//! Password hashing and verification.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier,
        SaltString,
    },
    Argon2,
};

/// Compares candidate passwords against stored hashes.
pub trait PasswordHasher: Send + Sync {
    /// Verify a candidate password against a stored PHC-format hash.
    ///
    /// `Ok(false)` on mismatch; `Err` only for malformed stored hashes.
    /// The comparison itself is constant-time.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool>;

    /// Hash a password for storage. Used by provisioning and tests.
    fn hash(&self, password: &str) -> Result<String>;
}

/// Argon2id with the crate's default memory-hard parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| anyhow!("invalid stored password hash: {err}"))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(err) => Err(anyhow!("password verification failed: {err}")),
        }
    }

    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?;
        Ok(hash.to_string())
    }
}
