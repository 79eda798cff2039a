//! Errors raised while talking to the tracker API.

use thiserror::Error;

/// Failure of a single tracker API call.
///
/// Every variant is treated as transient by the reporting loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Transport description of the timeout.
        message: String,
    },
    /// The request could not be sent or the response could not be read.
    #[error("transport failure: {message}")]
    Transport {
        /// Transport description of the failure.
        message: String,
    },
    /// The tracker answered with a non-success status.
    #[error("tracker responded with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Compacted response body preview.
        body: String,
    },
    /// The response body was not the expected JSON.
    #[error("invalid tracker response: {message}")]
    Decode {
        /// Decoder description of the failure.
        message: String,
    },
}

impl ClientError {
    /// Whether the tracker rejected a registration because the serial is
    /// already known.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Status { status: 409, .. })
    }
}
