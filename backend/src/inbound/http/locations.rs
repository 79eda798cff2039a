//! Location reporting and history handlers.
//!
//! ```text
//! POST /api/report_location          device report, authenticated by serial
//! GET  /api/devices/{serial}/history ascending history of an owned device
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::ReportLocationRequest;
use crate::domain::{Coordinates, Error, LocationRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ReasonCode, device_validation_error, field_error, parse_optional_timestamp, parse_serial,
};

/// Location report sent by a device.
///
/// `timestamp` (also accepted as `last_seen`) is ISO 8601; values without an
/// offset are read as UTC and an absent value means "now". Blank or absent
/// `current_location` and `current_status` keep the stored labels.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct ReportLocationBody {
    pub serial_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(alias = "last_seen")]
    pub timestamp: Option<String>,
    pub current_location: Option<String>,
    pub current_status: Option<String>,
}

fn label(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

impl TryFrom<ReportLocationBody> for ReportLocationRequest {
    type Error = Error;

    fn try_from(body: ReportLocationBody) -> Result<Self, Self::Error> {
        let serial_number = parse_serial(&body.serial_number)?;
        let latitude = body.latitude.ok_or_else(|| {
            field_error("latitude", ReasonCode::MissingField, "latitude is required")
        })?;
        let longitude = body.longitude.ok_or_else(|| {
            field_error("longitude", ReasonCode::MissingField, "longitude is required")
        })?;
        let position = Coordinates::new(latitude, longitude).map_err(device_validation_error)?;
        let observed_at = parse_optional_timestamp(body.timestamp.as_deref(), "timestamp")?;
        Ok(Self {
            serial_number,
            position,
            observed_at,
            current_location: label(body.current_location),
            current_status: label(body.current_status),
        })
    }
}

/// Record a device's position.
#[utoipa::path(
    post,
    path = "/api/report_location",
    request_body = ReportLocationBody,
    responses(
        (status = 200, description = "Location recorded", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown serial", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["locations"],
    operation_id = "reportLocation",
    security([])
)]
#[post("/report_location")]
pub async fn report_location(
    state: web::Data<HttpState>,
    payload: web::Json<ReportLocationBody>,
) -> ApiResult<web::Json<MessageResponse>> {
    let request = ReportLocationRequest::try_from(payload.into_inner())?;
    state.locations.report(request).await?;
    Ok(web::Json(MessageResponse::new("Location updated")))
}

/// History of an owned device, oldest first.
#[utoipa::path(
    get,
    path = "/api/devices/{serial}/history",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 200, description = "Location history", body = [LocationRecord]),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["locations"],
    operation_id = "deviceHistory",
    security(("SessionCookie" = []))
)]
#[get("/devices/{serial}/history")]
pub async fn device_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<LocationRecord>>> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    let history = state.locations.history(&serial_number, &owner).await?;
    Ok(web::Json(history))
}
