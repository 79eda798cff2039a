//! Devices tracked by the fleet service.
//!
//! A device is identified by its serial number for its whole life. The
//! "current" snapshot (position, status, location label, `last_seen`) is
//! mutated by location reports; static attributes are mutated only by the
//! owning operator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;

/// Maximum serial number length.
pub const SERIAL_NUMBER_MAX: usize = 100;
/// Maximum length of free-text device attributes.
pub const ATTRIBUTE_MAX: usize = 100;

/// Default `device_type` applied when the caller omits it.
pub const DEFAULT_DEVICE_TYPE: &str = "Unknown";
/// Default `current_status` applied when the caller omits it.
pub const DEFAULT_STATUS: &str = "active";
/// Default `current_location` label applied when the caller omits it.
pub const DEFAULT_LOCATION: &str = "Unknown";
/// Default `os_version` applied when the caller omits it.
pub const DEFAULT_OS_VERSION: &str = "Not specified";

/// Validation failures for device payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceValidationError {
    EmptySerialNumber,
    SerialNumberTooLong { max: usize },
    MissingField { field: &'static str },
    FieldTooLong { field: &'static str, max: usize },
    LatitudeOutOfRange { value: f64 },
    LongitudeOutOfRange { value: f64 },
    IncompletePosition,
}

impl fmt::Display for DeviceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySerialNumber => write!(f, "serial_number must not be empty"),
            Self::SerialNumberTooLong { max } => {
                write!(f, "serial_number must be at most {max} characters")
            }
            Self::MissingField { field } => write!(f, "{field} is required"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::LatitudeOutOfRange { value } => {
                write!(f, "latitude {value} must lie within [-90, 90]")
            }
            Self::LongitudeOutOfRange { value } => {
                write!(f, "longitude {value} must lie within [-180, 180]")
            }
            Self::IncompletePosition => {
                write!(f, "latitude and longitude must be supplied together")
            }
        }
    }
}

impl std::error::Error for DeviceValidationError {}

impl DeviceValidationError {
    /// Payload field the failure refers to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptySerialNumber | Self::SerialNumberTooLong { .. } => "serial_number",
            Self::MissingField { field } | Self::FieldTooLong { field, .. } => field,
            Self::LatitudeOutOfRange { .. } | Self::IncompletePosition => "latitude",
            Self::LongitudeOutOfRange { .. } => "longitude",
        }
    }
}

/// Globally unique, immutable device serial number.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::SerialNumber;
///
/// let serial = SerialNumber::new("  DEV-12345 ").expect("valid serial");
/// assert_eq!(serial.as_str(), "DEV-12345");
/// assert!(SerialNumber::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "DEV-48213")]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Trim and validate a serial number.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DeviceValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DeviceValidationError::EmptySerialNumber);
        }
        if trimmed.chars().count() > SERIAL_NUMBER_MAX {
            return Err(DeviceValidationError::SerialNumberTooLong {
                max: SERIAL_NUMBER_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the serial number.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SerialNumber> for String {
    fn from(value: SerialNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for SerialNumber {
    type Error = DeviceValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate latitude/longitude ranges.
    ///
    /// # Examples
    /// ```
    /// use fleet_tracker::domain::Coordinates;
    ///
    /// let nairobi = Coordinates::new(-1.286389, 36.817223).expect("valid position");
    /// assert_eq!(nairobi.latitude(), -1.286389);
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DeviceValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DeviceValidationError::LatitudeOutOfRange { value: latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DeviceValidationError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build an optional position from nullable parts, enforcing that both
    /// are present or both absent.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, DeviceValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(DeviceValidationError::IncompletePosition),
        }
    }

    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, DeviceValidationError> {
    let trimmed = value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(DeviceValidationError::MissingField { field })?;
    bounded(trimmed, field)
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
    default: &str,
) -> Result<String, DeviceValidationError> {
    match value.as_deref().map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => bounded(text, field),
        None => Ok(default.to_owned()),
    }
}

fn bounded(text: &str, field: &'static str) -> Result<String, DeviceValidationError> {
    if text.chars().count() > ATTRIBUTE_MAX {
        return Err(DeviceValidationError::FieldTooLong {
            field,
            max: ATTRIBUTE_MAX,
        });
    }
    Ok(text.to_owned())
}

/// Unvalidated device attributes as supplied by a client or the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAttributesDraft {
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub current_status: Option<String>,
    pub current_location: Option<String>,
    pub os_version: Option<String>,
}

/// Validated static device attributes plus the initial status labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeviceAttributes {
    pub name: String,
    pub make: String,
    pub model: String,
    pub device_type: String,
    pub current_status: String,
    pub current_location: String,
    pub os_version: String,
}

impl TryFrom<DeviceAttributesDraft> for DeviceAttributes {
    type Error = DeviceValidationError;

    fn try_from(draft: DeviceAttributesDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required_text(draft.name, "name")?,
            make: required_text(draft.make, "make")?,
            model: required_text(draft.model, "model")?,
            device_type: optional_text(draft.device_type, "device_type", DEFAULT_DEVICE_TYPE)?,
            current_status: optional_text(draft.current_status, "current_status", DEFAULT_STATUS)?,
            current_location: optional_text(
                draft.current_location,
                "current_location",
                DEFAULT_LOCATION,
            )?,
            os_version: optional_text(draft.os_version, "os_version", DEFAULT_OS_VERSION)?,
        })
    }
}

/// Partial update of the operator-editable attributes.
///
/// `None` leaves a field untouched. The serial number is deliberately
/// absent: it cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<String>,
    pub current_status: Option<String>,
    pub current_location: Option<String>,
}

impl DeviceUpdate {
    /// Trim and bound each supplied field. Blank strings are rejected rather
    /// than silently clearing an attribute.
    pub fn validated(self) -> Result<Self, DeviceValidationError> {
        fn field(
            value: Option<String>,
            name: &'static str,
        ) -> Result<Option<String>, DeviceValidationError> {
            value.map(|raw| required_text(Some(raw), name)).transpose()
        }
        Ok(Self {
            make: field(self.make, "make")?,
            model: field(self.model, "model")?,
            device_type: field(self.device_type, "device_type")?,
            current_status: field(self.current_status, "current_status")?,
            current_location: field(self.current_location, "current_location")?,
        })
    }

    /// Whether the update carries no changes.
    pub fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.device_type.is_none()
            && self.current_status.is_none()
            && self.current_location.is_none()
    }

    /// Apply the update to a set of attributes.
    pub fn apply_to(&self, attributes: &mut DeviceAttributes) {
        if let Some(make) = &self.make {
            attributes.make.clone_from(make);
        }
        if let Some(model) = &self.model {
            attributes.model.clone_from(model);
        }
        if let Some(device_type) = &self.device_type {
            attributes.device_type.clone_from(device_type);
        }
        if let Some(status) = &self.current_status {
            attributes.current_status.clone_from(status);
        }
        if let Some(location) = &self.current_location {
            attributes.current_location.clone_from(location);
        }
    }
}

/// Validated registration request handed to the device repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub serial_number: SerialNumber,
    pub attributes: DeviceAttributes,
    pub position: Option<Coordinates>,
    pub owner: Option<UserId>,
    /// Set when an initial position accompanies the registration.
    pub last_seen: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

/// Stored device aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: i64,
    pub serial_number: SerialNumber,
    pub attributes: DeviceAttributes,
    pub position: Option<Coordinates>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub owner: Option<UserId>,
}

impl Device {
    /// Whether `user` owns this device.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner.as_ref() == Some(user)
    }
}
