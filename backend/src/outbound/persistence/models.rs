//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{device_commands, device_location_history, devices, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub plan: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub plan: &'a str,
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceRow {
    pub id: i64,
    pub serial_number: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub device_type: String,
    pub current_status: String,
    pub current_location: String,
    pub os_version: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = devices)]
pub(crate) struct NewDeviceRow<'a> {
    pub serial_number: &'a str,
    pub name: &'a str,
    pub make: &'a str,
    pub model: &'a str,
    pub device_type: &'a str,
    pub current_status: &'a str,
    pub current_location: &'a str,
    pub os_version: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

/// Operator attribute edit; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = devices)]
pub(crate) struct DeviceAttributesChangeset<'a> {
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    pub device_type: Option<&'a str>,
    pub current_status: Option<&'a str>,
    pub current_location: Option<&'a str>,
    pub last_updated: DateTime<Utc>,
}

/// Snapshot overwrite applied by an accepted location report.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = devices)]
pub(crate) struct DeviceSnapshotChangeset<'a> {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub current_location: Option<&'a str>,
    pub current_status: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Location history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = device_location_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LocationHistoryRow {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = device_location_history)]
pub(crate) struct NewLocationHistoryRow {
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = device_commands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommandRow {
    pub id: i64,
    pub device_id: i64,
    pub command_type: String,
    pub command_data: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub issued_by: Option<Uuid>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = device_commands)]
pub(crate) struct NewCommandRow<'a> {
    pub device_id: i64,
    pub command_type: &'a str,
    pub command_data: &'a serde_json::Value,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub issued_by: Option<Uuid>,
}
