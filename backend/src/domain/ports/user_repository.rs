//! Port abstraction for operator account persistence.
use async_trait::async_trait;

use crate::domain::{EmailAddress, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Username or email is already registered.
        DuplicateAccount { message: String } => "account already exists: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn create(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Fetch an account by its normalised email.
    async fn find_by_email(&self, email: &EmailAddress)
    -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;
}

/// Fixture implementation for tests that never touch accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, _user: &User) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }
}
