//! Shared Diesel error mapping for the fleet repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Messages are fixed strings so SQL details stay in debug logs.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

/// Name of the violated unique constraint, when `error` is a unique
/// violation.
pub fn unique_violation_constraint(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Whether `error` is a foreign key violation.
pub fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}
