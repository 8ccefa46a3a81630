//! Business clock
//!
//! Every time-dependent decision reads "now" through [`Clock`], so tests can pin
//! the wall clock to a window boundary.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of the current instant in the business timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Wall clock projected into the configured timezone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Tz>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Pin the clock to a local wall-clock time in `tz`
    pub fn at_local(
        tz: Tz,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Option<Self> {
        tz.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .map(Self::new)
    }

    pub fn set(&self, now: DateTime<Tz>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::at_local(chrono_tz::Europe::Moscow, 2026, 10, 19, 9, 59).unwrap();
        clock.advance(Duration::minutes(16));
        let now = clock.now();
        assert_eq!((now.hour(), now.minute()), (10, 15));
    }
}
