//! Async connection pool for Diesel PostgreSQL connections.
//!
//! Wraps `diesel-async` and `bb8`. Checkout respects the configured timeout
//! and every failure surfaces as a [`PoolError`], which repositories map to
//! their `Connection` variant.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to check out a connection from the pool.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// Failed to build the connection pool.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Configuration for the database connection pool.
///
/// Defaults: 10 connections, no idle floor, 5 second checkout timeout. The
/// server overrides `max_size` from `TRACKER_DB_POOL_SIZE`.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use fleet_tracker::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://tracker@localhost/fleet")
///     .with_max_size(4)
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_size(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: None,
            connection_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Async connection pool for PostgreSQL via Diesel.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` when the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` when no connection becomes available
    /// within the configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
