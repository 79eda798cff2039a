//! Remote command handlers.
//!
//! ```text
//! POST /api/send_command              operator queues a command
//! GET  /api/device_commands/{serial}  device claims its pending commands
//! POST /api/command_ack               device reports the outcome
//! ```
//!
//! Device-facing routes authenticate by serial number only.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::domain::ports::EnqueueCommandRequest;
use crate::domain::{AckStatus, Command, CommandType, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ReasonCode, command_validation_error, field_error, parse_serial,
};

/// Operator request to queue a command.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct SendCommandBody {
    pub serial_number: String,
    pub command_type: String,
    /// Opaque payload forwarded to the device; defaults to `{}`.
    #[schema(value_type = Object)]
    pub command_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SendCommandResponse {
    pub message: String,
    pub command_id: i64,
}

/// Command as delivered to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommandDelivery {
    pub id: i64,
    #[serde(rename = "type")]
    pub command_type: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl From<Command> for CommandDelivery {
    fn from(command: Command) -> Self {
        Self {
            id: command.id,
            command_type: command.command_type.into(),
            data: command.payload,
            created_at: command.created_at,
        }
    }
}

/// Device acknowledgement. `status` is `executed` (default) or `failed`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct CommandAckBody {
    pub command_id: Option<i64>,
    pub status: Option<String>,
}

fn ack_status(raw: Option<&str>) -> Result<AckStatus, Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(AckStatus::default()),
        Some(value) => value.parse().map_err(|_| {
            field_error(
                "status",
                ReasonCode::InvalidValue,
                "status must be executed or failed",
            )
        }),
    }
}

/// Queue a command for one of the caller's devices.
#[utoipa::path(
    post,
    path = "/api/send_command",
    request_body = SendCommandBody,
    responses(
        (status = 200, description = "Command queued", body = SendCommandResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["commands"],
    operation_id = "sendCommand",
    security(("SessionCookie" = []))
)]
#[post("/send_command")]
pub async fn send_command(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendCommandBody>,
) -> ApiResult<web::Json<SendCommandResponse>> {
    let issued_by = session.require_user_id()?;
    let SendCommandBody {
        serial_number,
        command_type,
        command_data,
    } = payload.into_inner();
    let request = EnqueueCommandRequest {
        serial_number: parse_serial(&serial_number)?,
        issued_by,
        command_type: CommandType::new(&command_type).map_err(command_validation_error)?,
        payload: command_data
            .filter(|data| !data.is_null())
            .unwrap_or_else(|| json!({})),
    };
    let command = state.commands.enqueue(request).await?;
    Ok(web::Json(SendCommandResponse {
        message: "Command sent".to_owned(),
        command_id: command.id,
    }))
}

/// Claim every pending command for a device. Claimed commands are marked
/// `sent` and never returned again.
#[utoipa::path(
    get,
    path = "/api/device_commands/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 200, description = "Claimed commands, oldest first", body = [CommandDelivery]),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["commands"],
    operation_id = "deviceCommands",
    security([])
)]
#[get("/device_commands/{serial}")]
pub async fn device_commands(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CommandDelivery>>> {
    let serial_number = parse_serial(&path.into_inner())?;
    let claimed = state.commands.poll(&serial_number).await?;
    Ok(web::Json(
        claimed.into_iter().map(CommandDelivery::from).collect(),
    ))
}

/// Record the device's outcome for a delivered command. Repeated
/// acknowledgements overwrite the stored outcome.
#[utoipa::path(
    post,
    path = "/api/command_ack",
    request_body = CommandAckBody,
    responses(
        (status = 200, description = "Command acknowledged", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Command not found", body = Error),
        (status = 409, description = "Command not delivered yet", body = Error)
    ),
    tags = ["commands"],
    operation_id = "commandAck",
    security([])
)]
#[post("/command_ack")]
pub async fn command_ack(
    state: web::Data<HttpState>,
    payload: web::Json<CommandAckBody>,
) -> ApiResult<web::Json<MessageResponse>> {
    let CommandAckBody { command_id, status } = payload.into_inner();
    let command_id = command_id.ok_or_else(|| {
        field_error(
            "command_id",
            ReasonCode::MissingField,
            "command_id is required",
        )
    })?;
    let status = ack_status(status.as_deref())?;
    state.commands.acknowledge(command_id, status).await?;
    Ok(web::Json(MessageResponse::new("Command acknowledged")))
}
