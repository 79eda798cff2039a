//! Account service implementing signup and login.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    AccountService, PasswordHashError, PasswordHasher, UserRepository, UserRepositoryError,
};
use crate::domain::{Error, LoginCredentials, PlanTier, SignupDetails, User, UserId};

const INVALID_CREDENTIALS: &str = "invalid email or password";

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateAccount { message } => Error::conflict(message),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

/// Account service backed by a user repository and a password hasher.
#[derive(Clone)]
pub struct AccountsService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountsService<U, H> {
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl<U, H> AccountService for AccountsService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn signup(&self, details: SignupDetails) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(details.password())
            .map_err(map_hash_error)?;
        let user = User {
            id: UserId::random(),
            username: details.username().clone(),
            email: details.email().clone(),
            plan: PlanTier::Free,
            password_hash,
        };
        self.users.create(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_CREDENTIALS))?;
        let verified = self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .map_err(map_hash_error)?;
        if !verified {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(user)
    }
}

#[cfg(test)]
#[path = "accounts_service_tests.rs"]
mod tests;
