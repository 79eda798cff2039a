//! Remote commands queued for devices.
//!
//! Lifecycle is monotonic: `pending -> sent -> executed | failed`. Only the
//! poll transition (`pending -> sent`) and acknowledgement transition
//! (`sent | executed | failed -> executed | failed`) exist.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{SerialNumber, UserId};

/// Maximum length of a command type tag.
pub const COMMAND_TYPE_MAX: usize = 50;

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Sent,
    Executed,
    Failed,
}

impl CommandStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Executed => "executed",
            Self::Failed => "failed",
        }
    }
}

/// Error raised for an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommandStatus(pub String);

impl fmt::Display for UnknownCommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command status '{}'", self.0)
    }
}

impl std::error::Error for UnknownCommandStatus {}

impl FromStr for CommandStatus {
    type Err = UnknownCommandStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "executed" => Ok(Self::Executed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownCommandStatus(other.to_owned())),
        }
    }
}

/// Terminal status a device may report back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    #[default]
    Executed,
    Failed,
}

impl From<AckStatus> for CommandStatus {
    fn from(value: AckStatus) -> Self {
        match value {
            AckStatus::Executed => Self::Executed,
            AckStatus::Failed => Self::Failed,
        }
    }
}

impl FromStr for AckStatus {
    type Err = UnknownCommandStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "executed" => Ok(Self::Executed),
            "failed" => Ok(Self::Failed),
            _ => Err(UnknownCommandStatus(s.to_owned())),
        }
    }
}

/// Validation failures for enqueued commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValidationError {
    EmptyType,
    TypeTooLong { max: usize },
}

impl fmt::Display for CommandValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyType => write!(f, "command_type must not be empty"),
            Self::TypeTooLong { max } => {
                write!(f, "command_type must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CommandValidationError {}

/// Application-defined command tag such as `lock` or `ring`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandType(String);

impl CommandType {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CommandValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CommandValidationError::EmptyType);
        }
        if trimmed.chars().count() > COMMAND_TYPE_MAX {
            return Err(CommandValidationError::TypeTooLong {
                max: COMMAND_TYPE_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<CommandType> for String {
    fn from(value: CommandType) -> Self {
        value.0
    }
}

impl TryFrom<String> for CommandType {
    type Error = CommandValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Command ready to be enqueued.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommand {
    pub serial_number: SerialNumber,
    pub command_type: CommandType,
    /// Opaque JSON payload interpreted only by the device.
    pub payload: Value,
    pub issued_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Stored command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: i64,
    pub serial_number: SerialNumber,
    pub command_type: CommandType,
    pub payload: Value,
    pub status: CommandStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub issued_by: Option<UserId>,
}
