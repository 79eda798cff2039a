//! Device registry handlers.
//!
//! ```text
//! POST   /api/register_device            device self-registration
//! POST   /api/devices                    dashboard add-device form
//! GET    /api/devices                    caller's devices with presence
//! GET    /api/devices/{serial}           one owned device
//! PATCH  /api/devices/{serial}           partial attribute update
//! DELETE /api/devices/{serial}           delete with history and commands
//! GET    /api/device_location/{serial}   latest fix of an owned device
//! GET    /api/live_locations             positioned devices, compact time
//! GET    /api/all_devices                positioned devices, RFC 3339 time
//! GET    /api/my_devices?query=          serial substring search
//! POST   /api/lost_device                public last-known-position lookup
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{DeviceOverview, RegisterDeviceRequest};
use crate::domain::{
    Coordinates, Device, DeviceAttributes, DeviceAttributesDraft, DeviceUpdate, Error, Presence,
    UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    device_validation_error, parse_optional_user_id, parse_serial,
};

const LIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Registration payload shared by device self-registration and the
/// dashboard form.
///
/// `name`, `make`, and `model` are required. Omitted labels fall back to
/// `Unknown`, `active`, `Unknown`, and `Not specified`. `latitude` and
/// `longitude` must be supplied together.
///
/// `user_id` lets an unauthenticated agent register on behalf of an
/// existing account. A signed-in session always wins over it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct RegisterDeviceBody {
    pub serial_number: String,
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub current_status: Option<String>,
    pub current_location: Option<String>,
    pub os_version: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_id: Option<String>,
}

impl RegisterDeviceBody {
    fn into_request(self, owner: Option<UserId>) -> Result<RegisterDeviceRequest, Error> {
        let serial_number = parse_serial(&self.serial_number)?;
        let attributes = DeviceAttributes::try_from(DeviceAttributesDraft {
            name: self.name,
            make: self.make,
            model: self.model,
            device_type: self.device_type,
            current_status: self.current_status,
            current_location: self.current_location,
            os_version: self.os_version,
        })
        .map_err(device_validation_error)?;
        let position = Coordinates::from_optional(self.latitude, self.longitude)
            .map_err(device_validation_error)?;
        Ok(RegisterDeviceRequest {
            serial_number,
            attributes,
            position,
            owner,
        })
    }
}

/// Editable attributes. The serial number cannot be changed.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeviceBody {
    pub make: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub current_status: Option<String>,
    pub current_location: Option<String>,
}

impl From<UpdateDeviceBody> for DeviceUpdate {
    fn from(body: UpdateDeviceBody) -> Self {
        Self {
            make: body.make,
            model: body.model,
            device_type: body.device_type,
            current_status: body.current_status,
            current_location: body.current_location,
        }
    }
}

/// Full device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    pub id: i64,
    pub serial_number: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub device_type: String,
    pub current_status: String,
    pub current_location: String,
    pub os_version: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        let DeviceAttributes {
            name,
            make,
            model,
            device_type,
            current_status,
            current_location,
            os_version,
        } = device.attributes;
        Self {
            id: device.id,
            serial_number: device.serial_number.into(),
            name,
            make,
            model,
            device_type,
            current_status,
            current_location,
            os_version,
            latitude: device.position.map(|p| p.latitude()),
            longitude: device.position.map(|p| p.longitude()),
            last_seen: device.last_seen,
            last_updated: device.last_updated,
        }
    }
}

/// Dashboard row with derived presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceSummary {
    pub id: i64,
    pub name: String,
    pub serial_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub status: Presence,
}

impl From<DeviceOverview> for DeviceSummary {
    fn from(overview: DeviceOverview) -> Self {
        let DeviceOverview { device, presence } = overview;
        Self {
            id: device.id,
            name: device.attributes.name,
            serial_number: device.serial_number.into(),
            latitude: device.position.map(|p| p.latitude()),
            longitude: device.position.map(|p| p.longitude()),
            last_seen: device.last_seen,
            status: presence,
        }
    }
}

/// Latest fix of a device together with its descriptive attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceLocationResponse {
    pub name: String,
    pub serial_number: String,
    pub make: String,
    pub model: String,
    pub device_type: String,
    pub current_status: String,
    pub current_location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Map marker for a positioned device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PositionedDevice {
    pub serial_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_seen: Option<String>,
}

fn positioned(
    devices: Vec<Device>,
    render: impl Fn(DateTime<Utc>) -> String,
) -> Vec<PositionedDevice> {
    devices
        .into_iter()
        .filter_map(|device| {
            let position = device.position?;
            Some(PositionedDevice {
                serial_number: device.serial_number.into(),
                latitude: position.latitude(),
                longitude: position.longitude(),
                last_seen: device.last_seen.map(&render),
            })
        })
        .collect()
}

/// Query string for the serial search.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DeviceSearchQuery {
    /// Case-insensitive serial substring; blank lists everything.
    pub query: Option<String>,
}

/// Register a device.
///
/// Devices call this without a session and stay unowned. When an operator
/// session accompanies the request the device is bound to that operator.
#[utoipa::path(
    post,
    path = "/api/register_device",
    request_body = RegisterDeviceBody,
    responses(
        (status = 200, description = "Device registered", body = MessageResponse),
        (status = 400, description = "Invalid request or unknown user_id", body = Error),
        (status = 409, description = "Serial number already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["devices"],
    operation_id = "registerDevice",
    security([])
)]
#[post("/register_device")]
pub async fn register_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterDeviceBody>,
) -> ApiResult<web::Json<MessageResponse>> {
    let body = payload.into_inner();
    let owner = match session.user_id()? {
        Some(owner) => Some(owner),
        None => parse_optional_user_id(body.user_id.as_deref())?,
    };
    let request = body.into_request(owner)?;
    state.devices.register(request).await?;
    Ok(web::Json(MessageResponse::new(
        "Device registered successfully",
    )))
}

/// Add a device from the dashboard; the caller becomes its owner.
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = RegisterDeviceBody,
    responses(
        (status = 201, description = "Device added", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 409, description = "Serial number already registered", body = Error)
    ),
    tags = ["devices"],
    operation_id = "addDevice",
    security(("SessionCookie" = []))
)]
#[post("/devices")]
pub async fn add_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterDeviceBody>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let request = payload.into_inner().into_request(Some(owner))?;
    let device = state.devices.register(request).await?;
    Ok(HttpResponse::Created().json(DeviceResponse::from(device)))
}

/// Caller's devices with online/offline status.
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Devices", body = [DeviceSummary]),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["devices"],
    operation_id = "listDevices",
    security(("SessionCookie" = []))
)]
#[get("/devices")]
pub async fn list_devices(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<DeviceSummary>>> {
    let owner = session.require_user_id()?;
    let overview = state.devices.overview(&owner).await?;
    Ok(web::Json(
        overview.into_iter().map(DeviceSummary::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/devices/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 200, description = "Device", body = DeviceResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["devices"],
    operation_id = "getDevice",
    security(("SessionCookie" = []))
)]
#[get("/devices/{serial}")]
pub async fn get_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeviceResponse>> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    let device = state.devices.get(&serial_number, &owner).await?;
    Ok(web::Json(device.into()))
}

/// Update editable attributes. Omitted fields are left unchanged.
#[utoipa::path(
    patch,
    path = "/api/devices/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    request_body = UpdateDeviceBody,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["devices"],
    operation_id = "updateDevice",
    security(("SessionCookie" = []))
)]
#[patch("/devices/{serial}")]
pub async fn update_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateDeviceBody>,
) -> ApiResult<web::Json<DeviceResponse>> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    let update = DeviceUpdate::from(payload.into_inner())
        .validated()
        .map_err(device_validation_error)?;
    let device = state.devices.update(&serial_number, &owner, update).await?;
    Ok(web::Json(device.into()))
}

#[utoipa::path(
    delete,
    path = "/api/devices/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["devices"],
    operation_id = "deleteDevice",
    security(("SessionCookie" = []))
)]
#[delete("/devices/{serial}")]
pub async fn delete_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    state.devices.delete(&serial_number, &owner).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Latest known position of an owned device.
#[utoipa::path(
    get,
    path = "/api/device_location/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 200, description = "Latest location", body = DeviceLocationResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial or no location yet", body = Error)
    ),
    tags = ["devices"],
    operation_id = "deviceLocation",
    security(("SessionCookie" = []))
)]
#[get("/device_location/{serial}")]
pub async fn device_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeviceLocationResponse>> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    let device = state.devices.get(&serial_number, &owner).await?;
    let Some(position) = device.position else {
        return Err(Error::not_found(
            "Device not found or no location available",
        ));
    };
    let DeviceAttributes {
        name,
        make,
        model,
        device_type,
        current_status,
        current_location,
        ..
    } = device.attributes;
    Ok(web::Json(DeviceLocationResponse {
        name,
        serial_number: device.serial_number.into(),
        make,
        model,
        device_type,
        current_status,
        current_location,
        latitude: position.latitude(),
        longitude: position.longitude(),
        last_seen: device.last_seen,
    }))
}

/// Positioned devices for the live map, `last_seen` as `YYYY-MM-DD HH:MM:SS`.
#[utoipa::path(
    get,
    path = "/api/live_locations",
    responses(
        (status = 200, description = "Positioned devices", body = [PositionedDevice]),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["devices"],
    operation_id = "liveLocations",
    security(("SessionCookie" = []))
)]
#[get("/live_locations")]
pub async fn live_locations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PositionedDevice>>> {
    let owner = session.require_user_id()?;
    let devices = state.devices.list(&owner, None).await?;
    Ok(web::Json(positioned(devices, |seen| {
        seen.format(LIVE_TIMESTAMP_FORMAT).to_string()
    })))
}

/// Positioned devices with RFC 3339 `last_seen`.
#[utoipa::path(
    get,
    path = "/api/all_devices",
    responses(
        (status = 200, description = "Positioned devices", body = [PositionedDevice]),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["devices"],
    operation_id = "allDevices",
    security(("SessionCookie" = []))
)]
#[get("/all_devices")]
pub async fn all_devices(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PositionedDevice>>> {
    let owner = session.require_user_id()?;
    let devices = state.devices.list(&owner, None).await?;
    Ok(web::Json(positioned(devices, |seen| seen.to_rfc3339())))
}

/// Search the caller's devices by serial substring.
#[utoipa::path(
    get,
    path = "/api/my_devices",
    params(DeviceSearchQuery),
    responses(
        (status = 200, description = "Matching devices", body = [DeviceResponse]),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["devices"],
    operation_id = "searchDevices",
    security(("SessionCookie" = []))
)]
#[get("/my_devices")]
pub async fn my_devices(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<DeviceSearchQuery>,
) -> ApiResult<web::Json<Vec<DeviceResponse>>> {
    let owner = session.require_user_id()?;
    let devices = state.devices.list(&owner, query.into_inner().query).await?;
    Ok(web::Json(
        devices.into_iter().map(DeviceResponse::from).collect(),
    ))
}

/// Lookup body for a lost device.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LostDeviceBody {
    pub serial_number: String,
}

/// Last known fix returned by the lost-device lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LostDeviceLocation {
    pub serial_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Public lookup of a device's last known position by serial number.
///
/// Needs no session, so the response carries only the fix and never the
/// device attributes.
#[utoipa::path(
    post,
    path = "/api/lost_device",
    request_body = LostDeviceBody,
    responses(
        (status = 200, description = "Last known position", body = LostDeviceLocation),
        (status = 400, description = "Invalid serial number", body = Error),
        (status = 404, description = "Unknown serial or no position yet", body = Error)
    ),
    tags = ["devices"],
    operation_id = "lostDevice",
    security([])
)]
#[post("/lost_device")]
pub async fn lost_device(
    state: web::Data<HttpState>,
    payload: web::Json<LostDeviceBody>,
) -> ApiResult<web::Json<LostDeviceLocation>> {
    let serial_number = parse_serial(&payload.serial_number)?;
    let device = state.devices.locate(&serial_number).await?;
    let Some(position) = device.position else {
        return Err(Error::not_found("Device not found or not registered."));
    };
    Ok(web::Json(LostDeviceLocation {
        serial_number: device.serial_number.into(),
        latitude: position.latitude(),
        longitude: position.longitude(),
        last_seen: device.last_seen,
    }))
}

#[cfg(test)]
#[path = "devices_tests.rs"]
mod tests;
