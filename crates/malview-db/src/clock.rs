//! Wall-clock abstraction for cache expiry.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current time.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Simulated time that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward, saturating at the maximum timestamp.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
            *now = now
                .checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    /// Jumps to an arbitrary instant (may go backwards).
    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map_or(DateTime::<Utc>::MIN_UTC, |now| *now)
    }
}

/// Age of `written_at` relative to `now`; timestamps in the future are age 0.
pub fn age(now: DateTime<Utc>, written_at: DateTime<Utc>) -> Duration {
    now.signed_duration_since(written_at)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
