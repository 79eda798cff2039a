//! Driving port for the remote command queue.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{AckStatus, Command, CommandType, Error, SerialNumber, UserId};

/// Operator request to queue a command.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueCommandRequest {
    pub serial_number: SerialNumber,
    pub issued_by: UserId,
    pub command_type: CommandType,
    pub payload: Value,
}

/// Driving port for enqueueing, polling, and acknowledging commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandQueue: Send + Sync {
    /// Queue a command for a device the issuer owns.
    async fn enqueue(&self, request: EnqueueCommandRequest) -> Result<Command, Error>;

    /// Claim every pending command for a device. Each command is delivered
    /// at most once across concurrent pollers.
    async fn poll(&self, serial_number: &SerialNumber) -> Result<Vec<Command>, Error>;

    /// Record the device's outcome for a delivered command.
    async fn acknowledge(&self, command_id: i64, status: AckStatus) -> Result<Command, Error>;
}
