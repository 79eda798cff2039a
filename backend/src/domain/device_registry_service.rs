//! Device registry service.
//!
//! Owner-scoped operations follow one rule shared with the ledger and the
//! command queue: an unknown serial is `not_found`, a device owned by
//! another operator is `forbidden`.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    DeviceOverview, DeviceRegistry, DeviceRepository, DeviceRepositoryError,
    RegisterDeviceRequest,
};
use crate::domain::{Device, DeviceUpdate, Error, NewDevice, Presence, SerialNumber, UserId};

pub(crate) fn map_device_error(error: DeviceRepositoryError) -> Error {
    match error {
        DeviceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("device repository unavailable: {message}"))
        }
        DeviceRepositoryError::Query { message } => {
            Error::internal(format!("device repository error: {message}"))
        }
        DeviceRepositoryError::DuplicateSerial { serial_number } => {
            Error::conflict(format!("device {serial_number} is already registered"))
        }
        DeviceRepositoryError::UnknownOwner { owner } => {
            Error::invalid_request(format!("user {owner} does not exist")).with_details(
                serde_json::json!({ "field": "user_id", "code": "unknown_user" }),
            )
        }
    }
}

pub(crate) fn device_not_found(serial_number: &SerialNumber) -> Error {
    Error::not_found(format!("device {serial_number} not found"))
}

/// Resolve a device the caller owns.
pub(crate) async fn owned_device<D>(
    devices: &D,
    serial_number: &SerialNumber,
    owner: &UserId,
) -> Result<Device, Error>
where
    D: DeviceRepository + ?Sized,
{
    let device = devices
        .find_by_serial(serial_number)
        .await
        .map_err(map_device_error)?
        .ok_or_else(|| device_not_found(serial_number))?;
    if !device.is_owned_by(owner) {
        return Err(Error::forbidden(format!(
            "device {serial_number} belongs to another account"
        )));
    }
    Ok(device)
}

/// Device registry backed by a device repository.
#[derive(Clone)]
pub struct DeviceRegistryService<D> {
    devices: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<D> DeviceRegistryService<D> {
    pub fn new(devices: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self { devices, clock }
    }
}

#[async_trait]
impl<D> DeviceRegistry for DeviceRegistryService<D>
where
    D: DeviceRepository,
{
    async fn register(&self, request: RegisterDeviceRequest) -> Result<Device, Error> {
        let now = self.clock.utc();
        let new_device = NewDevice {
            serial_number: request.serial_number,
            attributes: request.attributes,
            position: request.position,
            owner: request.owner,
            last_seen: request.position.map(|_| now),
            registered_at: now,
        };
        let device = self
            .devices
            .insert(&new_device)
            .await
            .map_err(map_device_error)?;
        info!(
            serial_number = %device.serial_number,
            owned = device.owner.is_some(),
            "device registered"
        );
        Ok(device)
    }

    async fn get(&self, serial_number: &SerialNumber, owner: &UserId) -> Result<Device, Error> {
        owned_device(self.devices.as_ref(), serial_number, owner).await
    }

    async fn update(
        &self,
        serial_number: &SerialNumber,
        owner: &UserId,
        update: DeviceUpdate,
    ) -> Result<Device, Error> {
        let update = update
            .validated()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let device = owned_device(self.devices.as_ref(), serial_number, owner).await?;
        if update.is_empty() {
            return Ok(device);
        }
        self.devices
            .update_attributes(serial_number, &update, self.clock.utc())
            .await
            .map_err(map_device_error)?
            .ok_or_else(|| device_not_found(serial_number))
    }

    async fn delete(&self, serial_number: &SerialNumber, owner: &UserId) -> Result<(), Error> {
        owned_device(self.devices.as_ref(), serial_number, owner).await?;
        let removed = self
            .devices
            .delete(serial_number)
            .await
            .map_err(map_device_error)?;
        if !removed {
            return Err(device_not_found(serial_number));
        }
        info!(serial_number = %serial_number, "device deleted");
        Ok(())
    }

    async fn list(
        &self,
        owner: &UserId,
        serial_query: Option<String>,
    ) -> Result<Vec<Device>, Error> {
        let serial_query = serial_query
            .map(|query| query.trim().to_owned())
            .filter(|query| !query.is_empty());
        self.devices
            .list_for_owner(owner, serial_query)
            .await
            .map_err(map_device_error)
    }

    async fn locate(&self, serial_number: &SerialNumber) -> Result<Device, Error> {
        self.devices
            .find_by_serial(serial_number)
            .await
            .map_err(map_device_error)?
            .filter(|device| device.position.is_some())
            .ok_or_else(|| Error::not_found("Device not found or not registered."))
    }

    async fn overview(&self, owner: &UserId) -> Result<Vec<DeviceOverview>, Error> {
        let devices = self.list(owner, None).await?;
        let now = self.clock.utc();
        Ok(devices
            .into_iter()
            .map(|device| DeviceOverview {
                presence: Presence::at(device.last_seen, now),
                device,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "device_registry_service_tests.rs"]
mod tests;
