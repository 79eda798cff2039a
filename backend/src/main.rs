//! Tracker server entry-point: loads settings, prepares storage, and serves
//! the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fleet_tracker::inbound::http::health::HealthState;
use fleet_tracker::inbound::http::session_config::{BuildMode, session_settings_from_env};
use fleet_tracker::outbound::persistence::{DbPool, run_pending_migrations};
use server::{ServerConfig, TrackerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = TrackerSettings::load()
        .map_err(|err| eyre!("failed to load tracker settings: {err}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr()?;

    let mut config = ServerConfig::new(session, bind_addr);
    match settings.pool_config()? {
        Some(pool_config) => {
            run_pending_migrations(pool_config.database_url())
                .await
                .wrap_err("database migrations failed")?;
            let pool = DbPool::new(pool_config)
                .await
                .wrap_err("failed to build database pool")?;
            config = config.with_db_pool(pool);
            info!("using PostgreSQL storage");
        }
        None => warn!("TRACKER_DATABASE_URL unset; using in-memory storage"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting tracker server");
    create_server(health_state, config)?.await?;
    Ok(())
}
