//! Port for one-way password hashing.

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing failed or a stored hash could not be parsed.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Hash and verify operator passwords.
///
/// Implementations must produce self-describing hash strings (salt and
/// parameters embedded) so verification needs no extra state.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError>;
}
