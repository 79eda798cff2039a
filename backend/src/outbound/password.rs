//! Argon2id password hashing adapter.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Hashes passwords with Argon2id default parameters and a random salt.
///
/// Produces PHC strings (`$argon2id$v=19$...`), so the salt and cost
/// parameters travel with the hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|err| PasswordHashError::hash(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
