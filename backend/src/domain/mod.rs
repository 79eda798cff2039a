//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, plus the services that implement the driving ports.
//! Types validate on construction; document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifier.
//! - SerialNumber, Device, Coordinates: the device registry model.
//! - LocationReport, LocationRecord: the location ledger model.
//! - Command, CommandStatus, AckStatus: the command queue model.
//! - Presence: online/offline derivation.
//! - *Service types implementing the ports in [`ports`].

pub mod auth;
pub mod command;
pub mod device;
pub mod error;
pub mod location;
pub mod ports;
pub mod presence;
pub mod trace_id;
pub mod user;

mod accounts_service;
mod command_queue_service;
mod device_registry_service;
mod location_ledger_service;

pub use self::accounts_service::AccountsService;
pub use self::auth::{AuthValidationError, LoginCredentials, PASSWORD_MIN, SignupDetails};
pub use self::command::{
    AckStatus, COMMAND_TYPE_MAX, Command, CommandStatus, CommandType, CommandValidationError,
    NewCommand, UnknownCommandStatus,
};
pub use self::command_queue_service::CommandQueueService;
pub use self::device::{
    Coordinates, Device, DeviceAttributes, DeviceAttributesDraft, DeviceUpdate,
    DeviceValidationError, NewDevice, SerialNumber,
};
pub use self::device_registry_service::DeviceRegistryService;
pub use self::error::{Error, ErrorCode};
pub use self::location::{
    LocationRecord, LocationReport, ReportOutcome, TimestampParseError, history_to_csv,
    parse_client_timestamp,
};
pub use self::location_ledger_service::LocationLedgerService;
pub use self::presence::{PRESENCE_WINDOW_SECS, Presence, presence_window};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, PlanTier, User, UserId, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use fleet_tracker::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
