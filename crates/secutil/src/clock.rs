//! Wall-clock access
//!
//! Anything that needs "now" should take a [`Clock`] (or go through
//! [`crate::providers`]) so tests can pin time.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of the current UTC time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.write() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.write();
        *current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}

/// Current time from the process-wide default clock.
pub fn now() -> DateTime<Utc> {
    crate::providers::current().now()
}
