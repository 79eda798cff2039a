//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain constructors report what is wrong; these helpers turn that into a
//! `400` payload naming the offending field and a stable reason code.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{
    AuthValidationError, CommandValidationError, DeviceValidationError, Error, SerialNumber,
    UserId, parse_client_timestamp,
};

/// Reason codes carried in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReasonCode {
    MissingField,
    InvalidValue,
    OutOfRange,
    TooLong,
    InvalidTimestamp,
}

impl ReasonCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::OutOfRange => "out_of_range",
            Self::TooLong => "too_long",
            Self::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

pub(crate) fn field_error(field: &str, code: ReasonCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

pub(crate) fn device_validation_error(err: DeviceValidationError) -> Error {
    let code = match err {
        DeviceValidationError::EmptySerialNumber | DeviceValidationError::MissingField { .. } => {
            ReasonCode::MissingField
        }
        DeviceValidationError::SerialNumberTooLong { .. }
        | DeviceValidationError::FieldTooLong { .. } => ReasonCode::TooLong,
        DeviceValidationError::LatitudeOutOfRange { .. }
        | DeviceValidationError::LongitudeOutOfRange { .. } => ReasonCode::OutOfRange,
        DeviceValidationError::IncompletePosition => ReasonCode::MissingField,
    };
    field_error(err.field(), code, err.to_string())
}

pub(crate) fn auth_validation_error(err: AuthValidationError) -> Error {
    let code = match err {
        AuthValidationError::EmptyPassword => ReasonCode::MissingField,
        AuthValidationError::PasswordTooShort { .. }
        | AuthValidationError::Email(_)
        | AuthValidationError::Username(_) => ReasonCode::InvalidValue,
    };
    field_error(err.field(), code, err.to_string())
}

pub(crate) fn command_validation_error(err: CommandValidationError) -> Error {
    let code = match err {
        CommandValidationError::EmptyType => ReasonCode::MissingField,
        CommandValidationError::TypeTooLong { .. } => ReasonCode::TooLong,
    };
    field_error("command_type", code, err.to_string())
}

/// Parse a serial from a body field or path segment.
pub(crate) fn parse_serial(raw: &str) -> Result<SerialNumber, Error> {
    SerialNumber::new(raw).map_err(device_validation_error)
}

/// Parse an optional account id from a request body; blank means absent.
pub(crate) fn parse_optional_user_id(raw: Option<&str>) -> Result<Option<UserId>, Error> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            UserId::new(value.trim())
                .map_err(|err| field_error("user_id", ReasonCode::InvalidValue, err.to_string()))
        })
        .transpose()
}

/// Parse an optional client timestamp; offsets are honoured and naive
/// values are read as UTC.
pub(crate) fn parse_optional_timestamp(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, Error> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            parse_client_timestamp(value)
                .map_err(|err| field_error(field, ReasonCode::InvalidTimestamp, err.to_string()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::Value;

    use super::*;

    fn detail(error: &Error, key: &str) -> Option<String> {
        error
            .details()
            .and_then(|details| details.get(key))
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    #[rstest]
    #[case(DeviceValidationError::MissingField { field: "make" }, "make", "missing_field")]
    #[case(DeviceValidationError::LatitudeOutOfRange { value: 91.0 }, "latitude", "out_of_range")]
    #[case(
        DeviceValidationError::FieldTooLong { field: "model", max: 100 },
        "model",
        "too_long"
    )]
    fn device_errors_name_the_field(
        #[case] err: DeviceValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let error = device_validation_error(err);
        assert_eq!(detail(&error, "field").as_deref(), Some(field));
        assert_eq!(detail(&error, "code").as_deref(), Some(code));
    }

    #[rstest]
    fn blank_serials_are_rejected() {
        let error = parse_serial("   ").expect_err("blank serial");
        assert_eq!(detail(&error, "field").as_deref(), Some("serial_number"));
    }

    #[rstest]
    fn user_ids_must_be_uuids() {
        let error = parse_optional_user_id(Some("42")).expect_err("not a uuid");
        assert_eq!(detail(&error, "field").as_deref(), Some("user_id"));
        assert_eq!(detail(&error, "code").as_deref(), Some("invalid_value"));
        assert_eq!(parse_optional_user_id(Some("  ")), Ok(None));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn absent_timestamps_are_none(#[case] raw: Option<&str>) {
        assert_eq!(parse_optional_timestamp(raw, "timestamp"), Ok(None));
    }

    #[rstest]
    fn bad_timestamps_report_the_field() {
        let error = parse_optional_timestamp(Some("tuesday"), "timestamp").expect_err("bad");
        assert_eq!(detail(&error, "code").as_deref(), Some("invalid_timestamp"));
    }
}
