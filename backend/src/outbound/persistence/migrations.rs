//! Embedded schema migrations.

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations compiled in from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {0}")]
    Connect(#[from] diesel::ConnectionError),
    #[error("failed to apply migrations: {0}")]
    Apply(String),
    #[error("migration task failed: {0}")]
    Task(String),
}

fn run_blocking(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply(err.to_string()))?;
    Ok(applied.len())
}

/// Apply pending migrations on a blocking thread.
///
/// # Errors
///
/// Fails when the database is unreachable or a migration does not apply.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_blocking(&url))
        .await
        .map_err(|err| MigrationError::Task(err.to_string()))??;
    info!(applied, "database migrations up to date");
    Ok(())
}
