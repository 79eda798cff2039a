//! Authentication primitives such as login credentials and signup details.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::{EmailAddress, UserValidationError, Username};

/// Minimum accepted password length at signup.
pub const PASSWORD_MIN: usize = 8;

/// Domain error returned when authentication payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Username was missing or too long.
    Username(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(inner) | Self::Username(inner) => write!(f, "{inner}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for AuthValidationError {}

impl AuthValidationError {
    /// Name of the offending payload field, for error details.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Username(_) => "username",
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised by [`EmailAddress`].
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ops@Fleet.test", "hunter22").unwrap();
/// assert_eq!(creds.email().as_str(), "ops@fleet.test");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(AuthValidationError::Email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated account registration details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDetails {
    username: Username,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl SignupDetails {
    /// Validate raw signup inputs.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, AuthValidationError> {
        let username = Username::new(username).map_err(AuthValidationError::Username)?;
        let email = EmailAddress::new(email).map_err(AuthValidationError::Email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            username,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
