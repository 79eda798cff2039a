//! Port for the location ledger: append-only history plus the device
//! snapshot it feeds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{LocationRecord, LocationReport, ReportOutcome, SerialNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by location repository adapters.
    pub enum LocationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "location repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "location repository query failed: {message}",
    }
}

/// Port for recording reports and reading history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Append the report to history and, unless it is older than the stored
    /// `last_seen`, overwrite the device snapshot. Both writes happen in one
    /// transaction. Returns `None` when the serial is unknown.
    async fn record_report(
        &self,
        report: &LocationReport,
        recorded_at: DateTime<Utc>,
    ) -> Result<Option<ReportOutcome>, LocationRepositoryError>;

    /// History for a device, ascending by timestamp.
    async fn history(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Vec<LocationRecord>, LocationRepositoryError>;
}

/// Fixture implementation that accepts every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLocationRepository;

#[async_trait]
impl LocationRepository for FixtureLocationRepository {
    async fn record_report(
        &self,
        _report: &LocationReport,
        _recorded_at: DateTime<Utc>,
    ) -> Result<Option<ReportOutcome>, LocationRepositoryError> {
        Ok(Some(ReportOutcome::Applied))
    }

    async fn history(
        &self,
        _serial_number: &SerialNumber,
    ) -> Result<Vec<LocationRecord>, LocationRepositoryError> {
        Ok(Vec::new())
    }
}
