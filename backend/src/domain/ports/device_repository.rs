//! Port for device persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Device, DeviceUpdate, NewDevice, SerialNumber, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by device repository adapters.
    pub enum DeviceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "device repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "device repository query failed: {message}",
        /// A device with the serial number already exists.
        DuplicateSerial { serial_number: String } =>
            "device {serial_number} is already registered",
        /// The requested owner has no account.
        UnknownOwner { owner: String } => "user {owner} does not exist",
    }
}

/// Port for reading and writing device records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert a device. Fails with `DuplicateSerial` when the serial exists
    /// under any owner and with `UnknownOwner` when `device.owner` names no
    /// account.
    async fn insert(&self, device: &NewDevice) -> Result<Device, DeviceRepositoryError>;

    /// Look up a device by serial number.
    async fn find_by_serial(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Device>, DeviceRepositoryError>;

    /// Apply an attribute update, returning the stored device or `None`
    /// when the serial is unknown.
    async fn update_attributes(
        &self,
        serial_number: &SerialNumber,
        update: &DeviceUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Device>, DeviceRepositoryError>;

    /// Delete a device together with its history and commands. Returns
    /// whether a row was removed.
    async fn delete(&self, serial_number: &SerialNumber) -> Result<bool, DeviceRepositoryError>;

    /// List an owner's devices ordered by id, optionally filtered by a
    /// case-insensitive serial number substring.
    async fn list_for_owner(
        &self,
        owner: &UserId,
        serial_query: Option<String>,
    ) -> Result<Vec<Device>, DeviceRepositoryError>;
}

/// Fixture implementation for tests that do not exercise devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDeviceRepository;

#[async_trait]
impl DeviceRepository for FixtureDeviceRepository {
    async fn insert(&self, device: &NewDevice) -> Result<Device, DeviceRepositoryError> {
        Ok(Device {
            id: 1,
            serial_number: device.serial_number.clone(),
            attributes: device.attributes.clone(),
            position: device.position,
            last_seen: device.last_seen,
            last_updated: device.registered_at,
            owner: device.owner,
        })
    }

    async fn find_by_serial(
        &self,
        _serial_number: &SerialNumber,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        Ok(None)
    }

    async fn update_attributes(
        &self,
        _serial_number: &SerialNumber,
        _update: &DeviceUpdate,
        _updated_at: DateTime<Utc>,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _serial_number: &SerialNumber) -> Result<bool, DeviceRepositoryError> {
        Ok(false)
    }

    async fn list_for_owner(
        &self,
        _owner: &UserId,
        _serial_query: Option<String>,
    ) -> Result<Vec<Device>, DeviceRepositoryError> {
        Ok(Vec::new())
    }
}
