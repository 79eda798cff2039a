//! Operator accounts.
//!
//! Users own devices and issue commands. Account fields are validated on
//! construction so persistence adapters and handlers never see blank names
//! or malformed email addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum length accepted for usernames.
pub const USERNAME_MAX: usize = 80;
/// Maximum length accepted for email addresses.
pub const EMAIL_MAX: usize = 120;

/// Validation errors returned by account constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyUsername,
    UsernameTooLong { max: usize },
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    UnknownPlan { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::UnknownPlan { value } => {
                write!(f, "plan must be free, basic or pro (got {value})")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, format = "uuid")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from textual input.
    ///
    /// # Examples
    /// ```
    /// use fleet_tracker::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    /// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// assert!(UserId::new("nope").is_err());
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read back from storage.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unique login handle shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Trim and validate a username.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address used as the login identifier.
///
/// Only the coarse `local@domain` shape is checked; addresses are stored
/// lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_ascii_lowercase()))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Subscription tier recorded on the account. No feature gating hangs off it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Basic,
    Pro,
}

impl PlanTier {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
        }
    }
}

impl FromStr for PlanTier {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            other => Err(UserValidationError::UnknownPlan {
                value: other.to_owned(),
            }),
        }
    }
}

/// Registered operator account.
///
/// The password hash never leaves the persistence boundary through this
/// type's serialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    #[schema(value_type = String)]
    pub username: Username,
    #[schema(value_type = String)]
    pub email: EmailAddress,
    pub plan: PlanTier,
    #[serde(skip)]
    pub password_hash: String,
}
