//! Driving port for device registration and owner-scoped management.

use async_trait::async_trait;
use crate::domain::{
    Coordinates, Device, DeviceAttributes, DeviceUpdate, Error, Presence, SerialNumber, UserId,
};

/// Request to register a device.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterDeviceRequest {
    pub serial_number: SerialNumber,
    pub attributes: DeviceAttributes,
    /// Optional first fix supplied with the registration.
    pub position: Option<Coordinates>,
    /// Owning operator; devices registered without a session have none.
    pub owner: Option<UserId>,
}

/// Device paired with its presence at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOverview {
    pub device: Device,
    pub presence: Presence,
}

/// Driving port for device lifecycle operations.
///
/// Owner-scoped operations distinguish a missing device (`not_found`) from
/// a device owned by someone else (`forbidden`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Register a new device; the serial must be unused.
    async fn register(&self, request: RegisterDeviceRequest) -> Result<Device, Error>;

    /// Fetch a device the caller owns.
    async fn get(&self, serial_number: &SerialNumber, owner: &UserId) -> Result<Device, Error>;

    /// Update static attributes of a device the caller owns.
    async fn update(
        &self,
        serial_number: &SerialNumber,
        owner: &UserId,
        update: DeviceUpdate,
    ) -> Result<Device, Error>;

    /// Delete a device the caller owns, with its history and commands.
    async fn delete(&self, serial_number: &SerialNumber, owner: &UserId) -> Result<(), Error>;

    /// List the caller's devices, optionally filtered by serial substring.
    async fn list(&self, owner: &UserId, serial_query: Option<String>)
    -> Result<Vec<Device>, Error>;

    /// List the caller's devices with presence evaluated against the
    /// service clock.
    async fn overview(&self, owner: &UserId) -> Result<Vec<DeviceOverview>, Error>;

    /// Last known fix of any device, for the public lost-device lookup.
    ///
    /// Unknown serials and devices that never reported are the same
    /// `not_found`, so the answer does not reveal which serials exist.
    async fn locate(&self, serial_number: &SerialNumber) -> Result<Device, Error>;
}
