//! Online/offline derivation from a device's last accepted report.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A device counts as online while its last report is at most this many
/// seconds old.
pub const PRESENCE_WINDOW_SECS: i64 = 300;

/// [`PRESENCE_WINDOW_SECS`] as a duration.
pub fn presence_window() -> Duration {
    Duration::seconds(PRESENCE_WINDOW_SECS)
}

/// Derived connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    /// Evaluate presence at `now`.
    ///
    /// The window is inclusive: a report exactly [`PRESENCE_WINDOW_SECS`] old is
    /// still online. Devices that never reported are offline. A `last_seen`
    /// in the future (client clock skew) counts as online.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use fleet_tracker::domain::Presence;
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    /// assert_eq!(Presence::at(Some(now - Duration::seconds(300)), now), Presence::Online);
    /// assert_eq!(Presence::at(Some(now - Duration::seconds(301)), now), Presence::Offline);
    /// assert_eq!(Presence::at(None, now), Presence::Offline);
    /// ```
    pub fn at(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last_seen {
            Some(seen) if now - seen <= presence_window() => Self::Online,
            _ => Self::Offline,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}
