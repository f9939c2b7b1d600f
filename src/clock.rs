//! Injectable time source
//!
//! Streak continuation and the rate limiter both depend on "now". Reading
//! the system clock directly inside that logic would make every scenario
//! test wait on real wall-clock days, so time flows through a capability
//! that tests can replace with a manually advanced clock.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Normalize an instant to the start of its UTC calendar day.
///
/// Tracking logs carry no time-of-day component; every log for a given
/// day stores exactly this instant.
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&ts.date_naive().and_time(NaiveTime::MIN))
}

/// Manually advanced clock for tests
#[cfg(test)]
pub struct ManualClock {
    current: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }

    /// Clock pinned to an arbitrary mid-afternoon instant
    pub fn fixed() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap())
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap() = to;
    }

    pub fn advance_days(&self, days: i64) {
        let mut current = self.current.lock().unwrap();
        *current += chrono::Duration::days(days);
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut current = self.current.lock().unwrap();
        *current += chrono::Duration::seconds(secs);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
