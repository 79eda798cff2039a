//! Session cookie configuration.
//!
//! Environment toggles are validated once at startup. Debug builds fall back
//! to development-friendly defaults with a warning; release builds refuse to
//! start on anything missing or malformed.

use std::path::PathBuf;

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const SESSION_COOKIE_NAME: &str = "session";
/// Session lifetime; a login is valid for two hours.
pub const SESSION_TTL_SECS: i64 = 2 * 60 * 60;

const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults are tolerated with a warning.
    Debug,
    /// Every toggle must be present and valid.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    /// Accept `fallback` in debug builds, fail with `error` in release.
    fn tolerate<T>(
        self,
        fallback: T,
        error: SessionConfigError,
        warning: &str,
    ) -> Result<T, SessionConfigError> {
        match self {
            Self::Debug => {
                warn!(reason = %error, "{warning}");
                Ok(fallback)
            }
            Self::Release => Err(error),
        }
    }
}

/// Validated session settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Signing and encryption key for the cookie store.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Build the cookie-session middleware for these settings.
    ///
    /// Cookies are private (encrypted), HttpOnly, and expire after
    /// [`SESSION_TTL_SECS`].
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_http_only(true)
            .cookie_secure(self.cookie_secure)
            .cookie_same_site(self.same_site)
            .session_lifecycle(
                PersistentSession::default().session_ttl(CookieDuration::seconds(SESSION_TTL_SECS)),
            )
            .build()
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from environment variables and build mode.
///
/// # Errors
///
/// Release builds fail on any missing or malformed toggle, an unreadable or
/// short key file, `SameSite=None` without `Secure`, or ephemeral keys.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = bool_toggle(env, mode, COOKIE_SECURE_ENV, true)?;
    let same_site = same_site(env, mode, cookie_secure)?;
    let allow_ephemeral = bool_toggle(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = session_key(env, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn bool_toggle<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    fallback: bool,
) -> Result<bool, SessionConfigError> {
    let Some(value) = env.string(name) else {
        return mode.tolerate(
            fallback,
            SessionConfigError::MissingEnv { name },
            "session toggle not set; using default",
        );
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None => mode.tolerate(
            fallback,
            SessionConfigError::InvalidEnv {
                name,
                value,
                expected: BOOL_EXPECTED,
            },
            "session toggle invalid; using default",
        ),
    }
}

fn same_site<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let fallback = match mode {
        BuildMode::Debug => SameSite::Lax,
        BuildMode::Release => SameSite::Strict,
    };
    let Some(value) = env.string(SAMESITE_ENV) else {
        return mode.tolerate(
            fallback,
            SessionConfigError::MissingEnv { name: SAMESITE_ENV },
            "SESSION_SAMESITE not set; using default",
        );
    };
    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => mode.tolerate(
            SameSite::None,
            SessionConfigError::InsecureSameSiteNone,
            "browsers may reject SameSite=None cookies without Secure",
        ),
        _ => mode.tolerate(
            fallback,
            SessionConfigError::InvalidEnv {
                name: SAMESITE_ENV,
                value,
                expected: SAMESITE_EXPECTED,
            },
            "SESSION_SAMESITE invalid; using default",
        ),
    }
}

fn session_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(raw) => {
            let bytes = Zeroizing::new(raw);
            if bytes.len() < SESSION_KEY_MIN_LEN {
                let length = bytes.len();
                return mode.tolerate(
                    Key::generate(),
                    SessionConfigError::KeyTooShort {
                        path,
                        length,
                        min_len: SESSION_KEY_MIN_LEN,
                    },
                    "session key too short; using temporary key (dev only)",
                );
            }
            Ok(Key::derive_from(&bytes))
        }
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
