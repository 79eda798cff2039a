//! Port for the per-device command mailbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AckStatus, Command, NewCommand, SerialNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by command repository adapters.
    pub enum CommandRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "command repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "command repository query failed: {message}",
    }
}

/// Result of an acknowledgement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AckOutcome {
    /// The command moved to the reported terminal status.
    Acknowledged(Command),
    /// No command has the id.
    NotFound,
    /// The command was never delivered, so it cannot be acknowledged.
    StillPending,
}

/// Port for enqueueing, claiming, and acknowledging commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRepository: Send + Sync {
    /// Store a pending command. Returns `None` when the device no longer
    /// exists.
    async fn enqueue(&self, command: &NewCommand)
    -> Result<Option<Command>, CommandRepositoryError>;

    /// Atomically move every pending command for the device to `sent` and
    /// return them ordered by creation time. Concurrent callers never
    /// receive the same command. Returns `None` for an unknown serial.
    async fn claim_pending(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Vec<Command>>, CommandRepositoryError>;

    /// Record a terminal status for a delivered command. Repeated calls
    /// overwrite status and `executed_at`.
    async fn acknowledge(
        &self,
        command_id: i64,
        status: AckStatus,
        executed_at: DateTime<Utc>,
    ) -> Result<AckOutcome, CommandRepositoryError>;
}

/// Fixture implementation with an always-empty mailbox.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCommandRepository;

#[async_trait]
impl CommandRepository for FixtureCommandRepository {
    async fn enqueue(
        &self,
        _command: &NewCommand,
    ) -> Result<Option<Command>, CommandRepositoryError> {
        Ok(None)
    }

    async fn claim_pending(
        &self,
        _serial_number: &SerialNumber,
    ) -> Result<Option<Vec<Command>>, CommandRepositoryError> {
        Ok(Some(Vec::new()))
    }

    async fn acknowledge(
        &self,
        _command_id: i64,
        _status: AckStatus,
        _executed_at: DateTime<Utc>,
    ) -> Result<AckOutcome, CommandRepositoryError> {
        Ok(AckOutcome::NotFound)
    }
}
