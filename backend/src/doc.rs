//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint of the tracker, the schemas they
//! exchange, and the session cookie security scheme. Swagger UI serves it in
//! debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, LocationRecord, Presence};
use crate::inbound::http::accounts::{AccountResponse, LoginRequest, SignupRequest};
use crate::inbound::http::commands::{
    CommandAckBody, CommandDelivery, SendCommandBody, SendCommandResponse,
};
use crate::inbound::http::devices::{
    DeviceLocationResponse, DeviceResponse, DeviceSummary, LostDeviceBody, LostDeviceLocation,
    PositionedDevice, RegisterDeviceBody, UpdateDeviceBody,
};
use crate::inbound::http::locations::ReportLocationBody;
use crate::inbound::http::responses::MessageResponse;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/login.",
            ))),
        );
    }
}

/// OpenAPI document for the tracker API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fleet tracker API",
        description = "Device registration, location reporting, presence, and remote commands."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::devices::register_device,
        crate::inbound::http::devices::add_device,
        crate::inbound::http::devices::list_devices,
        crate::inbound::http::devices::get_device,
        crate::inbound::http::devices::update_device,
        crate::inbound::http::devices::delete_device,
        crate::inbound::http::devices::device_location,
        crate::inbound::http::devices::live_locations,
        crate::inbound::http::devices::all_devices,
        crate::inbound::http::devices::my_devices,
        crate::inbound::http::devices::lost_device,
        crate::inbound::http::locations::report_location,
        crate::inbound::http::locations::device_history,
        crate::inbound::http::export::export_history,
        crate::inbound::http::commands::send_command,
        crate::inbound::http::commands::device_commands,
        crate::inbound::http::commands::command_ack,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Presence,
        LocationRecord,
        MessageResponse,
        SignupRequest,
        LoginRequest,
        AccountResponse,
        RegisterDeviceBody,
        UpdateDeviceBody,
        DeviceResponse,
        DeviceSummary,
        LostDeviceBody,
        LostDeviceLocation,
        DeviceLocationResponse,
        PositionedDevice,
        ReportLocationBody,
        SendCommandBody,
        SendCommandResponse,
        CommandDelivery,
        CommandAckBody,
    )),
    tags(
        (name = "accounts", description = "Operator signup and sessions"),
        (name = "devices", description = "Device registry and presence"),
        (name = "locations", description = "Location reports, history, and export"),
        (name = "commands", description = "Remote command queue"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
