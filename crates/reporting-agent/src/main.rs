//! Reporting agent entry-point: registers the device, then reports simulated
//! positions until interrupted.

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use reporting_agent::config::{AgentArgs, AgentConfig};
use reporting_agent::{HttpTrackerClient, ReportingAgent, SimulatedSource};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AgentConfig::try_from(AgentArgs::parse()).wrap_err("invalid agent configuration")?;
    let client = HttpTrackerClient::new(config.server_url.clone(), config.timeout)
        .wrap_err("failed to build HTTP client")?;
    let agent = ReportingAgent::new(
        Arc::new(client),
        Box::new(SimulatedSource::default()),
        config.settings,
    );

    match agent.register().await {
        Ok(()) => {}
        Err(error) if error.is_conflict() => info!("device already registered"),
        Err(error) => warn!(%error, "registration failed; reporting anyway"),
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(error) => warn!(%error, "failed to listen for shutdown signal"),
        }
    });

    let summary = agent.run(cancel).await;
    info!(
        reports_sent = summary.reports_sent,
        failures = summary.failures,
        "agent stopped"
    );
    Ok(())
}
