//! Location reports and the append-only history they produce.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Coordinates, SerialNumber};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Error raised when a client-supplied timestamp cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParseError {
    value: String,
}

impl fmt::Display for TimestampParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp '{}' must be ISO 8601 (offset optional, UTC assumed)",
            self.value
        )
    }
}

impl std::error::Error for TimestampParseError {}

/// Parse a client timestamp, treating values without an offset as UTC.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::parse_client_timestamp;
///
/// let aware = parse_client_timestamp("2026-05-01T10:00:00+02:00").unwrap();
/// let naive = parse_client_timestamp("2026-05-01T08:00:00").unwrap();
/// assert_eq!(aware, naive);
/// ```
pub fn parse_client_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let trimmed = raw.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(aware.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampParseError {
            value: trimmed.to_owned(),
        })
}

/// A validated location report from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub serial_number: SerialNumber,
    pub position: Coordinates,
    /// Observation time; already resolved against the server clock when the
    /// client omitted it.
    pub observed_at: DateTime<Utc>,
    /// `None` keeps the stored label.
    pub current_location: Option<String>,
    /// `None` keeps the stored status.
    pub current_status: Option<String>,
}

/// Immutable history entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocationRecord {
    pub id: i64,
    #[schema(value_type = String)]
    pub serial_number: SerialNumber,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of applying a report to the device snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The snapshot now reflects the report.
    Applied,
    /// The report was older than the stored `last_seen`; it was recorded in
    /// history only.
    HistoryOnly,
}

/// Render history as CSV with a header row.
///
/// Rows are emitted in the order given, which callers keep ascending by
/// timestamp.
pub fn history_to_csv(records: &[LocationRecord]) -> String {
    let mut out = String::from("Serial Number,Latitude,Longitude,Timestamp\n");
    for record in records {
        out.push_str(&csv_field(record.serial_number.as_str()));
        out.push(',');
        out.push_str(&record.latitude.to_string());
        out.push(',');
        out.push_str(&record.longitude.to_string());
        out.push(',');
        out.push_str(&record.timestamp.to_rfc3339());
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
