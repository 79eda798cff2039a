//! Driving port for location reporting and history reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Coordinates, Error, LocationRecord, ReportOutcome, SerialNumber, UserId};

/// Location report as received from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLocationRequest {
    pub serial_number: SerialNumber,
    pub position: Coordinates,
    /// Client observation time; the service clock fills it in when absent.
    pub observed_at: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub current_status: Option<String>,
}

/// Driving port for the location ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationLedger: Send + Sync {
    /// Record a report for a known serial. Device calls are authenticated by
    /// serial only.
    async fn report(&self, request: ReportLocationRequest) -> Result<ReportOutcome, Error>;

    /// Ascending history of a device the caller owns.
    async fn history(
        &self,
        serial_number: &SerialNumber,
        owner: &UserId,
    ) -> Result<Vec<LocationRecord>, Error>;

    /// History rendered as CSV.
    async fn export_csv(&self, serial_number: &SerialNumber, owner: &UserId)
    -> Result<String, Error>;
}
