use chrono::{Local, TimeZone, Timelike, Utc};

/// Wall-clock source. Times are epoch milliseconds.
pub(crate) trait Clock {
    fn now_ms(&self) -> i64;

    /// Local hour of day (0..24) at the given instant.
    fn local_hour(&self, at_ms: i64) -> u32;
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn local_hour(&self, at_ms: i64) -> u32 {
        match Local.timestamp_millis_opt(at_ms).single() {
            Some(t) => t.hour(),
            None => Local::now().hour(),
        }
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;
