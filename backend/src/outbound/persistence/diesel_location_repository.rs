//! PostgreSQL-backed `LocationRepository` implementation using Diesel ORM.
//!
//! A report appends to `device_location_history` and overwrites the device
//! snapshot inside one transaction. The device row is locked with
//! `SELECT ... FOR UPDATE` so concurrent reports for the same device
//! serialise and the newest timestamp always wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{LocationRepository, LocationRepositoryError};
use crate::domain::{LocationRecord, LocationReport, ReportOutcome, SerialNumber};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DeviceSnapshotChangeset, LocationHistoryRow, NewLocationHistoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{device_location_history, devices};

/// Diesel-backed implementation of the location repository port.
#[derive(Clone)]
pub struct DieselLocationRepository {
    pool: DbPool,
}

impl DieselLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LocationRepositoryError {
    map_basic_pool_error(error, LocationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LocationRepositoryError {
    map_basic_diesel_error(
        error,
        LocationRepositoryError::query,
        LocationRepositoryError::connection,
    )
}

#[async_trait]
impl LocationRepository for DieselLocationRepository {
    async fn record_report(
        &self,
        report: &LocationReport,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<ReportOutcome>, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let target: Option<(i64, Option<DateTime<Utc>>)> = devices::table
                    .filter(devices::serial_number.eq(report.serial_number.as_str()))
                    .select((devices::id, devices::last_seen))
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some((device_id, last_seen)) = target else {
                    return Ok(None);
                };

                diesel::insert_into(device_location_history::table)
                    .values(&NewLocationHistoryRow {
                        device_id,
                        latitude: report.position.latitude(),
                        longitude: report.position.longitude(),
                        recorded_at: report.observed_at,
                    })
                    .execute(conn)
                    .await?;

                if last_seen.is_some_and(|seen| report.observed_at < seen) {
                    return Ok(Some(ReportOutcome::HistoryOnly));
                }

                diesel::update(devices::table.find(device_id))
                    .set(&DeviceSnapshotChangeset {
                        latitude: Some(report.position.latitude()),
                        longitude: Some(report.position.longitude()),
                        last_seen: Some(report.observed_at),
                        last_updated: recorded_at,
                        current_location: report.current_location.as_deref(),
                        current_status: report.current_status.as_deref(),
                    })
                    .execute(conn)
                    .await?;
                Ok(Some(ReportOutcome::Applied))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn history(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Vec<LocationRecord>, LocationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LocationHistoryRow> = device_location_history::table
            .inner_join(devices::table)
            .filter(devices::serial_number.eq(serial_number.as_str()))
            .order((
                device_location_history::recorded_at.asc(),
                device_location_history::id.asc(),
            ))
            .select(LocationHistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| LocationRecord {
                id: row.id,
                serial_number: serial_number.clone(),
                latitude: row.latitude,
                longitude: row.longitude,
                timestamp: row.recorded_at,
            })
            .collect())
    }
}
