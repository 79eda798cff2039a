//! Command-line and environment configuration for the agent binary.

use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::agent::AgentSettings;

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 3;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// Raw arguments; every flag falls back to an `AGENT_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "reporting-agent", about = "Report device positions to a fleet tracker")]
pub struct AgentArgs {
    /// Base URL of the tracker server.
    #[arg(long, env = "AGENT_SERVER_URL", default_value = "http://127.0.0.1:8080/")]
    pub server_url: String,
    /// Device serial number to register and report as.
    #[arg(long, env = "AGENT_SERIAL")]
    pub serial: String,
    /// Device name sent at registration.
    #[arg(long, env = "AGENT_DEVICE_NAME", default_value = "Rust Agent")]
    pub name: String,
    /// Seconds between reports.
    #[arg(long, env = "AGENT_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,
    /// Per-request timeout in seconds.
    #[arg(long, env = "AGENT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    /// Claim and acknowledge pending commands after each report.
    #[arg(long, env = "AGENT_POLL_COMMANDS")]
    pub poll_commands: bool,
    /// Account id (UUID) that should own the device once registered.
    #[arg(long, env = "AGENT_OWNER_ID")]
    pub owner_id: Option<String>,
}

/// Invalid agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The server URL did not parse or is not HTTP(S).
    #[error("invalid server URL '{value}': {message}")]
    ServerUrl {
        /// Rejected input.
        value: String,
        /// Parser description.
        message: String,
    },
    /// The serial number was blank.
    #[error("serial number must not be blank")]
    BlankSerial,
    /// A duration flag was zero.
    #[error("{field} must be at least one second")]
    ZeroDuration {
        /// Offending flag.
        field: &'static str,
    },
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Tracker base URL.
    pub server_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Loop settings.
    pub settings: AgentSettings,
}

impl TryFrom<AgentArgs> for AgentConfig {
    type Error = ConfigError;

    fn try_from(args: AgentArgs) -> Result<Self, Self::Error> {
        let raw_url = args.server_url.trim();
        let server_url = Url::parse(raw_url).map_err(|error| ConfigError::ServerUrl {
            value: raw_url.to_owned(),
            message: error.to_string(),
        })?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ConfigError::ServerUrl {
                value: raw_url.to_owned(),
                message: "scheme must be http or https".to_owned(),
            });
        }
        let serial = args.serial.trim();
        if serial.is_empty() {
            return Err(ConfigError::BlankSerial);
        }
        let interval = seconds(args.interval_secs, "interval")?;
        let timeout = seconds(args.timeout_secs, "timeout")?;
        let owner_id = args
            .owner_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        let name = match args.name.trim() {
            "" => "Rust Agent",
            trimmed => trimmed,
        };

        Ok(Self {
            server_url,
            timeout,
            settings: AgentSettings::new(serial, name, interval)
                .with_command_polling(args.poll_commands)
                .with_owner(owner_id),
        })
    }
}

const fn seconds(value: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(Duration::from_secs(value))
}
