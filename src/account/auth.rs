//! Identifier generation and password hashing

use argon2::{
    password_hash::{Output, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

use super::types::{PasswordHash, PasswordSalt, UserId};
use crate::config::HashingConfig;

/// Fixed salt used to spend hashing time on logins for unknown accounts.
const DUMMY_SALT: &str = "ZHVtbXlzYWx0ZHVtbXlzYWx0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid password")]
    InvalidPassword,
    #[error("stored salt is malformed: {0}")]
    InvalidSalt(String),
    #[error("stored hash is malformed: {0}")]
    InvalidHash(String),
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Generate a new opaque user identifier (UUID v4, OS randomness)
pub fn generate_id() -> UserId {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a fresh 128-bit salt
pub fn generate_salt() -> PasswordSalt {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

/// Argon2id hasher with explicit cost parameters.
///
/// `hash(password, salt)` is deterministic for a given configuration, so the
/// parameters must not change while records hashed with them are live.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(config: &HashingConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.memory_cost_kib,
            config.iterations,
            config.parallelism,
            Some(Params::DEFAULT_OUTPUT_LEN),
        )
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with the given salt
    pub fn hash(&self, password: &str, salt: &str) -> Result<PasswordHash, AuthError> {
        Ok(self.output(password, salt)?.to_string())
    }

    /// Hash a password with a freshly generated salt
    pub fn hash_new(&self, password: &str) -> Result<(PasswordSalt, PasswordHash), AuthError> {
        let salt = generate_salt();
        let hash = self.hash(password, &salt)?;
        Ok((salt, hash))
    }

    /// Verify a candidate password against a stored salt and hash.
    ///
    /// Comparison goes through `Output`, whose equality is constant-time.
    pub fn verify(&self, candidate: &str, salt: &str, stored_hash: &str) -> Result<(), AuthError> {
        let expected = Output::b64_decode(stored_hash)
            .map_err(|e| AuthError::InvalidHash(e.to_string()))?;
        let actual = self.output(candidate, salt)?;

        if actual == expected {
            Ok(())
        } else {
            Err(AuthError::InvalidPassword)
        }
    }

    /// Spend one hash computation without a stored record
    pub fn burn(&self, candidate: &str) {
        let _ = self.output(candidate, DUMMY_SALT);
    }

    fn output(&self, password: &str, salt: &str) -> Result<Output, AuthError> {
        let salt = SaltString::from_b64(salt).map_err(|e| AuthError::InvalidSalt(e.to_string()))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .hash
            .ok_or_else(|| AuthError::Hashing("no hash output".to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&HashingConfig {
        memory_cost_kib: 256,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
