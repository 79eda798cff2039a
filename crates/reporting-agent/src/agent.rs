//! Registration and the periodic reporting loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::client::{AckOutcome, DeviceRegistration, LocationReport, TrackerApi};
use crate::error::ClientError;
use crate::source::PositionSource;

const REPORT_STATUS: &str = "active";

/// Identity and cadence of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Device serial number.
    pub serial_number: String,
    /// Name sent at registration.
    pub device_name: String,
    /// Wait between successful cycles.
    pub interval: Duration,
    /// Claim and acknowledge pending commands after each report.
    pub poll_commands: bool,
    /// Account that should own the device when it registers.
    pub owner_id: Option<String>,
}

impl AgentSettings {
    /// Settings with command polling disabled.
    #[must_use]
    pub fn new(serial_number: &str, device_name: &str, interval: Duration) -> Self {
        Self {
            serial_number: serial_number.to_owned(),
            device_name: device_name.to_owned(),
            interval,
            poll_commands: false,
            owner_id: None,
        }
    }

    /// Toggle command polling.
    #[must_use]
    pub const fn with_command_polling(mut self, enabled: bool) -> Self {
        self.poll_commands = enabled;
        self
    }

    /// Register the device on behalf of `owner_id`.
    #[must_use]
    pub fn with_owner(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports the tracker accepted.
    pub reports_sent: u64,
    /// Cycles that failed at any step.
    pub failures: u64,
    /// Commands acknowledged as executed.
    pub commands_acknowledged: u64,
}

/// Samples positions and posts them to the tracker until cancelled.
pub struct ReportingAgent {
    api: Arc<dyn TrackerApi>,
    source: Box<dyn PositionSource>,
    settings: AgentSettings,
}

impl ReportingAgent {
    /// Assemble an agent from its API port, position source, and settings.
    #[must_use]
    pub fn new(
        api: Arc<dyn TrackerApi>,
        source: Box<dyn PositionSource>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            api,
            source,
            settings,
        }
    }

    /// Register the device with the tracker.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from the tracker; a duplicate serial is a
    /// 409 status, see [`ClientError::is_conflict`].
    pub async fn register(&self) -> Result<(), ClientError> {
        let registration =
            DeviceRegistration::for_agent(&self.settings.serial_number, &self.settings.device_name)
                .with_owner(self.settings.owner_id.clone());
        self.api.register(&registration).await?;
        info!(serial_number = %self.settings.serial_number, "device registered");
        Ok(())
    }

    /// Report on the configured interval until `cancel` fires.
    ///
    /// A report already in flight when the token fires completes; no new
    /// request starts afterwards, including the command poll that would
    /// follow it. Commands already claimed are still acknowledged so they
    /// do not stay stranded as delivered. Failed cycles are logged and
    /// retried after a backoff delay.
    pub async fn run(mut self, cancel: CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut backoff = Backoff::new(self.settings.interval);
        info!(
            serial_number = %self.settings.serial_number,
            interval = ?self.settings.interval,
            "reporting started"
        );

        while !cancel.is_cancelled() {
            match self.cycle(&cancel, &mut summary).await {
                Ok(()) => backoff.record_success(),
                Err(error) => {
                    backoff.record_failure();
                    summary.failures = summary.failures.saturating_add(1);
                    warn!(
                        serial_number = %self.settings.serial_number,
                        %error,
                        consecutive_failures = backoff.failures(),
                        "reporting cycle failed"
                    );
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(backoff.delay()) => {}
            }
        }

        info!(
            serial_number = %self.settings.serial_number,
            reports_sent = summary.reports_sent,
            failures = summary.failures,
            "reporting stopped"
        );
        summary
    }

    async fn cycle(
        &mut self,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Result<(), ClientError> {
        let position = self.source.next_position();
        let report = LocationReport {
            serial_number: self.settings.serial_number.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
            current_status: REPORT_STATUS.to_owned(),
        };
        self.api.report(&report).await?;
        summary.reports_sent = summary.reports_sent.saturating_add(1);
        debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "location sent"
        );

        if self.settings.poll_commands && !cancel.is_cancelled() {
            self.drain_commands(summary).await?;
        }
        Ok(())
    }

    /// Acknowledge every claimed command, returning the first failure once
    /// all of them have been attempted.
    async fn drain_commands(&self, summary: &mut RunSummary) -> Result<(), ClientError> {
        let commands = self
            .api
            .fetch_commands(&self.settings.serial_number)
            .await?;
        let mut first_failure = None;
        for command in commands {
            info!(
                command_id = command.id,
                command_type = %command.command_type,
                data = %command.data,
                "command received"
            );
            match self.api.acknowledge(command.id, AckOutcome::Executed).await {
                Ok(()) => {
                    summary.commands_acknowledged =
                        summary.commands_acknowledged.saturating_add(1);
                }
                Err(error) => {
                    warn!(command_id = command.id, %error, "command acknowledgement failed");
                    first_failure.get_or_insert(error);
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}
