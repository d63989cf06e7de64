//! Timestamp source for log entries and session headers

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, TimeZone};

/// `yyyy-MM-dd HH:mm:ss.SSS`, local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Wall clock that never goes backwards (millisecond resolution)
#[derive(Debug, Default)]
pub struct Clock {
    last_millis: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current local time, clamped to the latest time handed out so far
    pub fn now(&self) -> DateTime<Local> {
        self.observe(Local::now())
    }

    fn observe(&self, candidate: DateTime<Local>) -> DateTime<Local> {
        let millis = candidate.timestamp_millis();
        let previous = self.last_millis.fetch_max(millis, Ordering::AcqRel);
        if previous > millis {
            Local
                .timestamp_millis_opt(previous)
                .single()
                .unwrap_or(candidate)
        } else {
            candidate
        }
    }
}

/// Render a timestamp the way it appears in the log file
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_now_is_non_decreasing() {
        let clock = Clock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn test_clock_does_not_go_backwards() {
        let clock = Clock::new();
        let first = clock.now();
        let earlier = first - Duration::seconds(30);

        let observed = clock.observe(earlier);
        assert_eq!(observed.timestamp_millis(), first.timestamp_millis());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Local.with_ymd_and_hms(2026, 1, 21, 14, 30, 45).unwrap()
            + Duration::milliseconds(7);
        assert_eq!(format_timestamp(&ts), "2026-01-21 14:30:45.007");
    }
}
