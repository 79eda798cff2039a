//! Command queue service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::device_registry_service::{device_not_found, owned_device};
use crate::domain::ports::{
    AckOutcome, CommandQueue, CommandRepository, CommandRepositoryError, DeviceRepository,
    EnqueueCommandRequest,
};
use crate::domain::{AckStatus, Command, Error, NewCommand, SerialNumber};

fn map_command_error(error: CommandRepositoryError) -> Error {
    match error {
        CommandRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("command repository unavailable: {message}"))
        }
        CommandRepositoryError::Query { message } => {
            Error::internal(format!("command repository error: {message}"))
        }
    }
}

/// Command queue backed by device and command repositories.
#[derive(Clone)]
pub struct CommandQueueService<D, C> {
    devices: Arc<D>,
    commands: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<D, C> CommandQueueService<D, C> {
    pub fn new(devices: Arc<D>, commands: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            devices,
            commands,
            clock,
        }
    }
}

#[async_trait]
impl<D, C> CommandQueue for CommandQueueService<D, C>
where
    D: DeviceRepository,
    C: CommandRepository,
{
    async fn enqueue(&self, request: EnqueueCommandRequest) -> Result<Command, Error> {
        owned_device(
            self.devices.as_ref(),
            &request.serial_number,
            &request.issued_by,
        )
        .await?;
        let new_command = NewCommand {
            serial_number: request.serial_number,
            command_type: request.command_type,
            payload: request.payload,
            issued_by: request.issued_by,
            created_at: self.clock.utc(),
        };
        let command = self
            .commands
            .enqueue(&new_command)
            .await
            .map_err(map_command_error)?
            .ok_or_else(|| device_not_found(&new_command.serial_number))?;
        info!(
            command_id = command.id,
            serial_number = %command.serial_number,
            command_type = command.command_type.as_str(),
            "command queued"
        );
        Ok(command)
    }

    async fn poll(&self, serial_number: &SerialNumber) -> Result<Vec<Command>, Error> {
        let claimed = self
            .commands
            .claim_pending(serial_number)
            .await
            .map_err(map_command_error)?
            .ok_or_else(|| device_not_found(serial_number))?;
        if !claimed.is_empty() {
            info!(
                serial_number = %serial_number,
                count = claimed.len(),
                "commands delivered"
            );
        }
        Ok(claimed)
    }

    async fn acknowledge(&self, command_id: i64, status: AckStatus) -> Result<Command, Error> {
        match self
            .commands
            .acknowledge(command_id, status, self.clock.utc())
            .await
            .map_err(map_command_error)?
        {
            AckOutcome::Acknowledged(command) => {
                info!(command_id, status = command.status.as_str(), "command acknowledged");
                Ok(command)
            }
            AckOutcome::NotFound => Err(Error::not_found(format!(
                "command {command_id} not found"
            ))),
            AckOutcome::StillPending => Err(Error::conflict(format!(
                "command {command_id} has not been delivered yet"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "command_queue_service_tests.rs"]
mod tests;
