//! Driving port for operator signup and login.
//!
//! Inbound adapters call this port to create accounts and authenticate
//! credentials without importing persistence or hashing infrastructure.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, SignupDetails, User};

/// Domain use-case port for accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account on the free plan. Duplicate usernames or emails
    /// yield a conflict.
    async fn signup(&self, details: SignupDetails) -> Result<User, Error>;

    /// Validate credentials and return the account. Unknown emails and wrong
    /// passwords are indistinguishable to the caller.
    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;
}
