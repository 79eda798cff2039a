//! Test utilities shared by unit tests across the crate.
//!
//! Only compiled for `cargo test`.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Device, DeviceAttributes, DeviceAttributesDraft, SerialNumber, User, UserId,
};

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant most fixtures are built around.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn serial(raw: &str) -> SerialNumber {
    SerialNumber::new(raw).expect("valid fixture serial")
}

pub fn attributes(name: &str) -> DeviceAttributes {
    DeviceAttributes::try_from(DeviceAttributesDraft {
        name: Some(name.to_owned()),
        make: Some("Acme".to_owned()),
        model: Some("Tracker 2".to_owned()),
        ..DeviceAttributesDraft::default()
    })
    .expect("valid fixture attributes")
}

/// Device with no position owned by `owner`.
pub fn device(raw_serial: &str, owner: Option<UserId>) -> Device {
    Device {
        id: 1,
        serial_number: serial(raw_serial),
        attributes: attributes("Field unit"),
        position: None,
        last_seen: None,
        last_updated: fixture_now(),
        owner,
    }
}

/// Account with a placeholder hash.
pub fn user(username: &str) -> User {
    User {
        id: UserId::random(),
        username: crate::domain::Username::new(username).expect("valid fixture username"),
        email: crate::domain::EmailAddress::new(format!("{username}@fleet.test"))
            .expect("valid fixture email"),
        plan: crate::domain::PlanTier::Free,
        password_hash: "fixture-hash".to_owned(),
    }
}
