//! Clock seam for expiry handling.
//!
//! All expiry comparisons in the engine take "now" from an injected
//! [`Clock`] rather than from `NOW()` in SQL, so tests can drive a
//! lock past its expiry deterministically with [`ManualClock`].

use std::sync::RwLock;

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Settable clock for tests.
///
/// Starts at the real current time; `advance` and `set` move it.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += duration;
    }

    pub fn set(&self, instant: Timestamp) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::default();
        let before = clock.now();
        clock.advance(Duration::minutes(16));
        assert_eq!(clock.now() - before, Duration::minutes(16));
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::default();
        let target = Utc::now() + Duration::days(3);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
