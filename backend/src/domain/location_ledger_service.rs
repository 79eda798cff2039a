//! Location ledger service: report ingestion, history and CSV export.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::device_registry_service::{device_not_found, owned_device};
use crate::domain::ports::{
    DeviceRepository, LocationLedger, LocationRepository, LocationRepositoryError,
    ReportLocationRequest,
};
use crate::domain::{
    Error, LocationRecord, LocationReport, ReportOutcome, SerialNumber, UserId, history_to_csv,
};

fn map_location_error(error: LocationRepositoryError) -> Error {
    match error {
        LocationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("location repository unavailable: {message}"))
        }
        LocationRepositoryError::Query { message } => {
            Error::internal(format!("location repository error: {message}"))
        }
    }
}

/// Ledger service backed by device and location repositories.
#[derive(Clone)]
pub struct LocationLedgerService<D, L> {
    devices: Arc<D>,
    locations: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<D, L> LocationLedgerService<D, L> {
    pub fn new(devices: Arc<D>, locations: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            devices,
            locations,
            clock,
        }
    }
}

#[async_trait]
impl<D, L> LocationLedger for LocationLedgerService<D, L>
where
    D: DeviceRepository,
    L: LocationRepository,
{
    async fn report(&self, request: ReportLocationRequest) -> Result<ReportOutcome, Error> {
        let now = self.clock.utc();
        let report = LocationReport {
            serial_number: request.serial_number,
            position: request.position,
            observed_at: request.observed_at.unwrap_or(now),
            current_location: request.current_location,
            current_status: request.current_status,
        };
        let outcome = self
            .locations
            .record_report(&report, now)
            .await
            .map_err(map_location_error)?
            .ok_or_else(|| device_not_found(&report.serial_number))?;
        match outcome {
            ReportOutcome::Applied => debug!(
                serial_number = %report.serial_number,
                observed_at = %report.observed_at,
                "location recorded"
            ),
            ReportOutcome::HistoryOnly => info!(
                serial_number = %report.serial_number,
                observed_at = %report.observed_at,
                "out-of-order report kept in history only"
            ),
        }
        Ok(outcome)
    }

    async fn history(
        &self,
        serial_number: &SerialNumber,
        owner: &UserId,
    ) -> Result<Vec<LocationRecord>, Error> {
        owned_device(self.devices.as_ref(), serial_number, owner).await?;
        self.locations
            .history(serial_number)
            .await
            .map_err(map_location_error)
    }

    async fn export_csv(
        &self,
        serial_number: &SerialNumber,
        owner: &UserId,
    ) -> Result<String, Error> {
        let records = self.history(serial_number, owner).await?;
        Ok(history_to_csv(&records))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockDeviceRepository, MockLocationRepository};
    use crate::domain::{Coordinates, ErrorCode};
    use crate::test_support::{MutableClock, device, fixture_now, serial};

    fn request(observed_at: Option<chrono::DateTime<chrono::Utc>>) -> ReportLocationRequest {
        ReportLocationRequest {
            serial_number: serial("DEV-9"),
            position: Coordinates::new(-1.2864, 36.8172).expect("valid position"),
            observed_at,
            current_location: None,
            current_status: None,
        }
    }

    fn ledger(
        devices: MockDeviceRepository,
        locations: MockLocationRepository,
    ) -> LocationLedgerService<MockDeviceRepository, MockLocationRepository> {
        LocationLedgerService::new(
            Arc::new(devices),
            Arc::new(locations),
            Arc::new(MutableClock::new(fixture_now())),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn missing_timestamp_uses_service_clock() {
        let mut locations = MockLocationRepository::new();
        locations
            .expect_record_report()
            .withf(|report, recorded_at| {
                report.observed_at == fixture_now() && *recorded_at == fixture_now()
            })
            .times(1)
            .return_once(|_, _| Ok(Some(ReportOutcome::Applied)));

        let outcome = ledger(MockDeviceRepository::new(), locations)
            .report(request(None))
            .await
            .expect("report succeeds");

        assert_eq!(outcome, ReportOutcome::Applied);
    }

    #[rstest]
    #[tokio::test]
    async fn client_timestamp_is_passed_through() {
        let observed = fixture_now() - Duration::minutes(10);
        let mut locations = MockLocationRepository::new();
        locations
            .expect_record_report()
            .withf(move |report, _| report.observed_at == observed)
            .return_once(|_, _| Ok(Some(ReportOutcome::HistoryOnly)));

        let outcome = ledger(MockDeviceRepository::new(), locations)
            .report(request(Some(observed)))
            .await
            .expect("report succeeds");

        assert_eq!(outcome, ReportOutcome::HistoryOnly);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_serial_is_not_found() {
        let mut locations = MockLocationRepository::new();
        locations.expect_record_report().return_once(|_, _| Ok(None));

        let error = ledger(MockDeviceRepository::new(), locations)
            .report(request(None))
            .await
            .expect_err("unknown serial");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn query_failures_are_internal() {
        let mut locations = MockLocationRepository::new();
        locations
            .expect_record_report()
            .return_once(|_, _| Err(LocationRepositoryError::query("deadlock detected")));

        let error = ledger(MockDeviceRepository::new(), locations)
            .report(request(None))
            .await
            .expect_err("storage failure");

        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn history_of_foreign_device_is_forbidden() {
        let mut devices = MockDeviceRepository::new();
        devices
            .expect_find_by_serial()
            .return_once(|_| Ok(Some(device("DEV-9", Some(UserId::random())))));
        let mut locations = MockLocationRepository::new();
        locations.expect_history().times(0);

        let error = ledger(devices, locations)
            .history(&serial("DEV-9"), &UserId::random())
            .await
            .expect_err("foreign device");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn export_renders_owned_history() {
        let owner = UserId::random();
        let mut devices = MockDeviceRepository::new();
        devices
            .expect_find_by_serial()
            .return_once(move |_| Ok(Some(device("DEV-9", Some(owner)))));
        let mut locations = MockLocationRepository::new();
        locations.expect_history().return_once(|_| {
            Ok(vec![LocationRecord {
                id: 1,
                serial_number: serial("DEV-9"),
                latitude: 1.5,
                longitude: 2.5,
                timestamp: fixture_now(),
            }])
        });

        let csv = ledger(devices, locations)
            .export_csv(&serial("DEV-9"), &owner)
            .await
            .expect("export succeeds");

        assert_eq!(
            csv,
            "Serial Number,Latitude,Longitude,Timestamp\nDEV-9,1.5,2.5,2026-04-02T09:00:00+00:00\n"
        );
    }
}
