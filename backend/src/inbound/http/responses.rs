//! Small response bodies shared by several handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain acknowledgement such as `{"message": "Location updated"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
