//! PostgreSQL-backed `DeviceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DeviceRepository, DeviceRepositoryError};
use crate::domain::{
    Coordinates, Device, DeviceAttributes, DeviceUpdate, NewDevice, SerialNumber, UserId,
};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
    unique_violation_constraint,
};
use super::models::{DeviceAttributesChangeset, DeviceRow, NewDeviceRow};
use super::pool::{DbPool, PoolError};
use super::schema::devices;

/// Diesel-backed implementation of the device repository port.
#[derive(Clone)]
pub struct DieselDeviceRepository {
    pool: DbPool,
}

impl DieselDeviceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DeviceRepositoryError {
    map_basic_pool_error(error, DeviceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DeviceRepositoryError {
    map_basic_diesel_error(
        error,
        DeviceRepositoryError::query,
        DeviceRepositoryError::connection,
    )
}

/// Escape `LIKE` metacharacters so a search term matches literally.
pub(super) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Convert a database row into a validated domain device.
pub(super) fn row_to_device(row: DeviceRow) -> Result<Device, DeviceRepositoryError> {
    let invalid = |err: crate::domain::DeviceValidationError| {
        DeviceRepositoryError::query(format!("invalid stored device: {err}"))
    };
    Ok(Device {
        id: row.id,
        serial_number: SerialNumber::new(row.serial_number).map_err(invalid)?,
        attributes: DeviceAttributes {
            name: row.name,
            make: row.make,
            model: row.model,
            device_type: row.device_type,
            current_status: row.current_status,
            current_location: row.current_location,
            os_version: row.os_version,
        },
        position: Coordinates::from_optional(row.latitude, row.longitude).map_err(invalid)?,
        last_seen: row.last_seen,
        last_updated: row.last_updated,
        owner: row.user_id.map(UserId::from_uuid),
    })
}

#[async_trait]
impl DeviceRepository for DieselDeviceRepository {
    async fn insert(&self, device: &NewDevice) -> Result<Device, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let attributes = &device.attributes;
        let row = NewDeviceRow {
            serial_number: device.serial_number.as_str(),
            name: &attributes.name,
            make: &attributes.make,
            model: &attributes.model,
            device_type: &attributes.device_type,
            current_status: &attributes.current_status,
            current_location: &attributes.current_location,
            os_version: &attributes.os_version,
            latitude: device.position.map(|position| position.latitude()),
            longitude: device.position.map(|position| position.longitude()),
            last_seen: device.last_seen,
            last_updated: device.registered_at,
            user_id: device.owner.map(|owner| *owner.as_uuid()),
        };
        let stored = diesel::insert_into(devices::table)
            .values(&row)
            .returning(DeviceRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if unique_violation_constraint(&err).is_some() {
                    DeviceRepositoryError::duplicate_serial(device.serial_number.as_str())
                } else if is_foreign_key_violation(&err) {
                    let owner = device.owner.map(|id| id.to_string()).unwrap_or_default();
                    DeviceRepositoryError::unknown_owner(owner)
                } else {
                    map_diesel_error(err)
                }
            })?;
        row_to_device(stored)
    }

    async fn find_by_serial(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = devices::table
            .filter(devices::serial_number.eq(serial_number.as_str()))
            .select(DeviceRow::as_select())
            .first::<DeviceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_device).transpose()
    }

    async fn update_attributes(
        &self,
        serial_number: &SerialNumber,
        update: &DeviceUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = DeviceAttributesChangeset {
            make: update.make.as_deref(),
            model: update.model.as_deref(),
            device_type: update.device_type.as_deref(),
            current_status: update.current_status.as_deref(),
            current_location: update.current_location.as_deref(),
            last_updated: updated_at,
        };
        let row = diesel::update(
            devices::table.filter(devices::serial_number.eq(serial_number.as_str())),
        )
        .set(&changeset)
        .returning(DeviceRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(row_to_device).transpose()
    }

    async fn delete(&self, serial_number: &SerialNumber) -> Result<bool, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            devices::table.filter(devices::serial_number.eq(serial_number.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
        serial_query: Option<String>,
    ) -> Result<Vec<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = devices::table
            .filter(devices::user_id.eq(owner.as_uuid()))
            .into_boxed();
        if let Some(term) = serial_query {
            let pattern = format!("%{}%", escape_like(&term));
            query = query.filter(devices::serial_number.ilike(pattern));
        }
        let rows: Vec<DeviceRow> = query
            .order(devices::id.asc())
            .select(DeviceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_device).collect()
    }
}
