//! Tracker API port and its reqwest-backed adapter.
//!
//! The adapter owns transport details only: URL resolution, request bodies,
//! timeout and status mapping, and JSON decoding of delivered commands.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Attributes sent when the agent registers its device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRegistration {
    /// Device serial number.
    pub serial_number: String,
    /// Human-readable device name.
    pub name: String,
    /// Manufacturer label.
    pub make: String,
    /// Model label.
    pub model: String,
    /// Device category label.
    pub device_type: String,
    /// Initial status label.
    pub current_status: String,
    /// Initial location label.
    pub current_location: String,
    /// Owning account, when the agent registers on someone's behalf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl DeviceRegistration {
    /// Registration describing this agent.
    ///
    /// # Examples
    ///
    /// ```
    /// use reporting_agent::DeviceRegistration;
    ///
    /// let registration = DeviceRegistration::for_agent("DEV-1", "Field unit");
    /// assert_eq!(registration.make, "Rust");
    /// assert_eq!(registration.current_location, "Registered");
    /// ```
    #[must_use]
    pub fn for_agent(serial_number: &str, name: &str) -> Self {
        Self {
            serial_number: serial_number.to_owned(),
            name: name.to_owned(),
            make: "Rust".to_owned(),
            model: "reporting-agent".to_owned(),
            device_type: "Phone".to_owned(),
            current_status: "active".to_owned(),
            current_location: "Registered".to_owned(),
            user_id: None,
        }
    }

    /// Attach the owning account id.
    #[must_use]
    pub fn with_owner(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// One location report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    /// Reporting device.
    pub serial_number: String,
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Status label stored on the device snapshot.
    pub current_status: String,
}

/// Command claimed from the device mailbox.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingCommand {
    /// Command identifier used for acknowledgement.
    pub id: i64,
    /// Command type label.
    #[serde(rename = "type")]
    pub command_type: String,
    /// Opaque payload.
    #[serde(default)]
    pub data: Value,
    /// Server-side creation time, RFC 3339.
    pub created_at: String,
}

/// Outcome reported back for a delivered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckOutcome {
    /// The command ran.
    Executed,
    /// The command could not be carried out.
    Failed,
}

#[derive(Serialize)]
struct AckBody {
    command_id: i64,
    status: AckOutcome,
}

/// Calls the agent makes against the tracker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// Register the device. A duplicate serial surfaces as a 409
    /// [`ClientError::Status`].
    async fn register(&self, registration: &DeviceRegistration) -> Result<(), ClientError>;

    /// Post one location report.
    async fn report(&self, report: &LocationReport) -> Result<(), ClientError>;

    /// Claim every pending command for the device.
    async fn fetch_commands(&self, serial_number: &str)
    -> Result<Vec<PendingCommand>, ClientError>;

    /// Acknowledge a delivered command.
    async fn acknowledge(&self, command_id: i64, outcome: AckOutcome) -> Result<(), ClientError>;
}

/// Tracker client issuing JSON requests with a per-request timeout.
pub struct HttpTrackerClient {
    client: Client,
    base: Url,
}

impl HttpTrackerClient {
    /// Build a client rooted at `base`.
    ///
    /// A missing trailing slash is added so API paths resolve beneath the
    /// base path instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|error| ClientError::Transport {
            message: format!("invalid endpoint '{path}': {error}"),
        })
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

#[async_trait]
impl TrackerApi for HttpTrackerClient {
    async fn register(&self, registration: &DeviceRegistration) -> Result<(), ClientError> {
        self.post_json("api/register_device", registration).await
    }

    async fn report(&self, report: &LocationReport) -> Result<(), ClientError> {
        self.post_json("api/report_location", report).await
    }

    async fn fetch_commands(
        &self,
        serial_number: &str,
    ) -> Result<Vec<PendingCommand>, ClientError> {
        let mut url = self.endpoint("api/device_commands/")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Transport {
                message: "tracker base URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push(serial_number);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_commands(body.as_ref())
    }

    async fn acknowledge(&self, command_id: i64, outcome: AckOutcome) -> Result<(), ClientError> {
        self.post_json(
            "api/command_ack",
            &AckBody {
                command_id,
                status: outcome,
            },
        )
        .await
    }
}

fn parse_commands(body: &[u8]) -> Result<Vec<PendingCommand>, ClientError> {
    serde_json::from_slice(body).map_err(|error| ClientError::Decode {
        message: format!("invalid command list: {error}"),
    })
}

fn map_transport_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout {
            message: error.to_string(),
        }
    } else {
        ClientError::Transport {
            message: error.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ClientError {
    ClientError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
