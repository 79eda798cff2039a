//! Reporting agent for the fleet tracker.
//!
//! The agent registers a device with the tracker, then samples a position on
//! a fixed interval and posts it to the location ledger until it is
//! cancelled. Failed reports never stop the loop; consecutive failures only
//! stretch the wait before the next attempt.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use reporting_agent::{AgentSettings, HttpTrackerClient, ReportingAgent, SimulatedSource};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let base = "http://127.0.0.1:8080/".parse()?;
//! let client = HttpTrackerClient::new(base, Duration::from_secs(6))?;
//! let agent = ReportingAgent::new(
//!     Arc::new(client),
//!     Box::new(SimulatedSource::default()),
//!     AgentSettings::new("DEV-12345", "Field unit", Duration::from_secs(3)),
//! );
//! agent.register().await?;
//! let summary = agent.run(CancellationToken::new()).await;
//! assert_eq!(summary.failures, 0);
//! # Ok(())
//! # }
//! ```

mod agent;
mod backoff;
mod client;
pub mod config;
mod error;
mod source;

pub use agent::{AgentSettings, ReportingAgent, RunSummary};
pub use backoff::{Backoff, MAX_BACKOFF};
pub use client::{
    AckOutcome, DeviceRegistration, HttpTrackerClient, LocationReport, PendingCommand, TrackerApi,
};
pub use error::ClientError;
pub use source::{FixedSource, Position, PositionSource, SIMULATED_ORIGIN, SimulatedSource};
