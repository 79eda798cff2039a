//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, User, UserId, Username};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_constraint,
};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    if let Some(constraint) = unique_violation_constraint(&error) {
        let message = if constraint.contains("email") {
            "email already registered"
        } else {
            "username already taken"
        };
        return UserRepositoryError::duplicate_account(message);
    }
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let invalid = |err: crate::domain::UserValidationError| {
        UserRepositoryError::query(format!("invalid stored account: {err}"))
    };
    Ok(User {
        id: UserId::from_uuid(row.id),
        username: Username::new(row.username).map_err(invalid)?,
        email: EmailAddress::new(row.email).map_err(invalid)?,
        plan: row.plan.parse().map_err(invalid)?,
        password_hash: row.password_hash,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            username: user.username.as_str(),
            email: user.email.as_str(),
            password_hash: &user.password_hash,
            plan: user.plan.as_str(),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }
}
