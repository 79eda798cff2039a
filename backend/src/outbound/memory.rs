//! In-process adapter backing every repository port with one shared store.
//!
//! Used when no `TRACKER_DATABASE_URL` is configured and by HTTP tests. A
//! single mutex guards all tables, so each port call observes and mutates a
//! consistent snapshot the way one database transaction would. The lock is
//! never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    AckOutcome, CommandRepository, CommandRepositoryError, DeviceRepository,
    DeviceRepositoryError, LocationRepository, LocationRepositoryError, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    AckStatus, Command, CommandStatus, Device, DeviceUpdate, EmailAddress, LocationRecord,
    LocationReport, NewCommand, NewDevice, ReportOutcome, SerialNumber, User, UserId,
};

#[derive(Debug, Clone)]
struct HistoryEntry {
    id: i64,
    device_id: i64,
    latitude: f64,
    longitude: f64,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct FleetTables {
    users: Vec<User>,
    devices: BTreeMap<i64, Device>,
    history: Vec<HistoryEntry>,
    commands: BTreeMap<i64, Command>,
    next_device_id: i64,
    next_history_id: i64,
    next_command_id: i64,
}

impl FleetTables {
    fn device_by_serial(&self, serial_number: &SerialNumber) -> Option<&Device> {
        self.devices
            .values()
            .find(|device| &device.serial_number == serial_number)
    }

    fn device_by_serial_mut(&mut self, serial_number: &SerialNumber) -> Option<&mut Device> {
        self.devices
            .values_mut()
            .find(|device| &device.serial_number == serial_number)
    }

    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Shared in-memory implementation of the user, device, location, and
/// command repositories.
///
/// Clone an `Arc<InMemoryFleetStore>` into each service so they all see the
/// same data.
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    tables: Mutex<FleetTables>,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, FleetTables> {
        // A panic while holding the lock cannot leave a half-applied write
        // behind: every mutation below completes before returning.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryFleetStore {
    async fn create(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables();
        if tables.users.iter().any(|existing| existing.email == user.email) {
            return Err(UserRepositoryError::duplicate_account(
                "email already registered",
            ));
        }
        if tables
            .users
            .iter()
            .any(|existing| existing.username == user.username)
        {
            return Err(UserRepositoryError::duplicate_account(
                "username already taken",
            ));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| &user.id == id)
            .cloned())
    }
}

#[async_trait]
impl DeviceRepository for InMemoryFleetStore {
    async fn insert(&self, device: &NewDevice) -> Result<Device, DeviceRepositoryError> {
        let mut tables = self.tables();
        if tables.device_by_serial(&device.serial_number).is_some() {
            return Err(DeviceRepositoryError::duplicate_serial(
                device.serial_number.as_str(),
            ));
        }
        if let Some(owner) = device.owner {
            if !tables.users.iter().any(|user| user.id == owner) {
                return Err(DeviceRepositoryError::unknown_owner(owner.to_string()));
            }
        }
        let id = FleetTables::allocate(&mut tables.next_device_id);
        let stored = Device {
            id,
            serial_number: device.serial_number.clone(),
            attributes: device.attributes.clone(),
            position: device.position,
            last_seen: device.last_seen,
            last_updated: device.registered_at,
            owner: device.owner,
        };
        tables.devices.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_serial(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        Ok(self.tables().device_by_serial(serial_number).cloned())
    }

    async fn update_attributes(
        &self,
        serial_number: &SerialNumber,
        update: &DeviceUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        let mut tables = self.tables();
        let Some(device) = tables.device_by_serial_mut(serial_number) else {
            return Ok(None);
        };
        update.apply_to(&mut device.attributes);
        device.last_updated = updated_at;
        Ok(Some(device.clone()))
    }

    async fn delete(&self, serial_number: &SerialNumber) -> Result<bool, DeviceRepositoryError> {
        let mut tables = self.tables();
        let Some(device_id) = tables.device_by_serial(serial_number).map(|device| device.id)
        else {
            return Ok(false);
        };
        tables.devices.remove(&device_id);
        tables.history.retain(|entry| entry.device_id != device_id);
        tables
            .commands
            .retain(|_, command| &command.serial_number != serial_number);
        Ok(true)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
        serial_query: Option<String>,
    ) -> Result<Vec<Device>, DeviceRepositoryError> {
        let needle = serial_query.map(|query| query.to_lowercase());
        Ok(self
            .tables()
            .devices
            .values()
            .filter(|device| device.is_owned_by(owner))
            .filter(|device| {
                needle.as_deref().is_none_or(|needle| {
                    device
                        .serial_number
                        .as_str()
                        .to_lowercase()
                        .contains(needle)
                })
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LocationRepository for InMemoryFleetStore {
    async fn record_report(
        &self,
        report: &LocationReport,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<ReportOutcome>, LocationRepositoryError> {
        let mut tables = self.tables();
        let Some((device_id, last_seen)) = tables
            .device_by_serial(&report.serial_number)
            .map(|device| (device.id, device.last_seen))
        else {
            return Ok(None);
        };

        let history_id = FleetTables::allocate(&mut tables.next_history_id);
        tables.history.push(HistoryEntry {
            id: history_id,
            device_id,
            latitude: report.position.latitude(),
            longitude: report.position.longitude(),
            recorded_at: report.observed_at,
        });

        if last_seen.is_some_and(|seen| report.observed_at < seen) {
            return Ok(Some(ReportOutcome::HistoryOnly));
        }

        if let Some(device) = tables.devices.get_mut(&device_id) {
            device.position = Some(report.position);
            device.last_seen = Some(report.observed_at);
            device.last_updated = recorded_at;
            if let Some(location) = &report.current_location {
                device.attributes.current_location.clone_from(location);
            }
            if let Some(status) = &report.current_status {
                device.attributes.current_status.clone_from(status);
            }
        }
        Ok(Some(ReportOutcome::Applied))
    }

    async fn history(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Vec<LocationRecord>, LocationRepositoryError> {
        let tables = self.tables();
        let Some(device_id) = tables.device_by_serial(serial_number).map(|device| device.id)
        else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<&HistoryEntry> = tables
            .history
            .iter()
            .filter(|entry| entry.device_id == device_id)
            .collect();
        entries.sort_by_key(|entry| (entry.recorded_at, entry.id));
        Ok(entries
            .into_iter()
            .map(|entry| LocationRecord {
                id: entry.id,
                serial_number: serial_number.clone(),
                latitude: entry.latitude,
                longitude: entry.longitude,
                timestamp: entry.recorded_at,
            })
            .collect())
    }
}

#[async_trait]
impl CommandRepository for InMemoryFleetStore {
    async fn enqueue(
        &self,
        command: &NewCommand,
    ) -> Result<Option<Command>, CommandRepositoryError> {
        let mut tables = self.tables();
        if tables.device_by_serial(&command.serial_number).is_none() {
            return Ok(None);
        }
        let id = FleetTables::allocate(&mut tables.next_command_id);
        let stored = Command {
            id,
            serial_number: command.serial_number.clone(),
            command_type: command.command_type.clone(),
            payload: command.payload.clone(),
            status: CommandStatus::Pending,
            created_at: command.created_at,
            executed_at: None,
            issued_by: Some(command.issued_by),
        };
        tables.commands.insert(id, stored.clone());
        Ok(Some(stored))
    }

    async fn claim_pending(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Vec<Command>>, CommandRepositoryError> {
        let mut tables = self.tables();
        if tables.device_by_serial(serial_number).is_none() {
            return Ok(None);
        }
        let mut claimed: Vec<Command> = tables
            .commands
            .values_mut()
            .filter(|command| {
                &command.serial_number == serial_number
                    && command.status == CommandStatus::Pending
            })
            .map(|command| {
                command.status = CommandStatus::Sent;
                command.clone()
            })
            .collect();
        claimed.sort_by_key(|command| (command.created_at, command.id));
        Ok(Some(claimed))
    }

    async fn acknowledge(
        &self,
        command_id: i64,
        status: AckStatus,
        executed_at: DateTime<Utc>,
    ) -> Result<AckOutcome, CommandRepositoryError> {
        let mut tables = self.tables();
        let Some(command) = tables.commands.get_mut(&command_id) else {
            return Ok(AckOutcome::NotFound);
        };
        if command.status == CommandStatus::Pending {
            return Ok(AckOutcome::StillPending);
        }
        command.status = status.into();
        command.executed_at = Some(executed_at);
        Ok(AckOutcome::Acknowledged(command.clone()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
