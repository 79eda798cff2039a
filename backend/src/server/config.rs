//! Server settings and the configuration object handed to `create_server`.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use fleet_tracker::inbound::http::session_config::SessionSettings;
use fleet_tracker::outbound::persistence::{DbPool, PoolConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Settings loaded from `TRACKER_*` environment variables, configuration
/// files, and command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TRACKER")]
pub struct TrackerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
}

/// Errors raised while interpreting [`TrackerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("database pool size must be at least 1")]
    PoolSize,
}

impl TrackerSettings {
    /// Listen address, falling back to [`DEFAULT_BIND_ADDR`].
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self
            .bind_addr
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Pool settings when a database URL is configured.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let Some(url) = self
            .database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        else {
            return Ok(None);
        };
        let mut config = PoolConfig::new(url);
        if let Some(size) = self.db_pool_size {
            if size == 0 {
                return Err(SettingsError::PoolSize);
            }
            config = config.with_max_size(size);
        }
        Ok(Some(config))
    }
}

/// Everything `create_server` needs.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            db_pool: None,
        }
    }

    /// Back the services with PostgreSQL instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
