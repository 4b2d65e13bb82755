//! Deterministic `Clock` implementations.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use quizwire_core::clock::Clock;

/// Always returns the wrapped instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Starts at a given instant and advances by a fixed step on every `now()`
/// call. Lets tests produce distinct, predictable timestamps — e.g. a
/// player whose response time must come out to an exact number of seconds.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: Duration,
    ticks: Mutex<i64>,
}

impl SteppingClock {
    /// Creates a clock whose n-th `now()` call returns `start + n * step`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step,
            ticks: Mutex::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut ticks = self.ticks.lock().expect("clock mutex poisoned");
        let now = self.start + self.step * i32::try_from(*ticks).unwrap_or(i32::MAX);
        *ticks += 1;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stepping_clock_advances_per_call() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::seconds(2));

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(2));
        assert_eq!(clock.now(), start + Duration::seconds(4));
    }
}
