use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Timelike, Utc};

// Base shift from UTC to the gate's wall clock (AEST); the schedule policy's
// offset flag adds the extra daylight-saving hour.
pub const BASE_OFFSET_HOURS: u32 = 10;

pub trait WallTime: Send + Sync + 'static {
    fn time_of_day(&self, extra_hour: bool) -> (u8, u8);
}

// System UTC clock plus a correction kept up to date by time sync. While no
// sync has succeeded the correction is zero and the system clock serves as-is.
#[derive(Debug, Default)]
pub struct SyncedClock {
    correction_ms: AtomicI64,
}

impl SyncedClock {
    pub fn new() -> Self {
        Self {
            correction_ms: AtomicI64::new(0),
        }
    }

    pub fn apply_sync(&self, server_now: DateTime<Utc>) {
        let correction = server_now.signed_duration_since(Utc::now());
        self.correction_ms
            .store(correction.num_milliseconds(), Ordering::Relaxed);
    }

    pub fn correction_ms(&self) -> i64 {
        self.correction_ms.load(Ordering::Relaxed)
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        Utc::now() + Duration::milliseconds(self.correction_ms())
    }

    pub fn local_time_of_day(&self, extra_hour: bool) -> (u8, u8) {
        time_of_day_at(self.now_utc(), extra_hour)
    }
}

impl WallTime for SyncedClock {
    fn time_of_day(&self, extra_hour: bool) -> (u8, u8) {
        self.local_time_of_day(extra_hour)
    }
}

pub fn time_of_day_at(utc: DateTime<Utc>, extra_hour: bool) -> (u8, u8) {
    let mut hour = (utc.hour() + BASE_OFFSET_HOURS) % 24;
    if extra_hour {
        hour = (hour + 1) % 24;
    }
    (hour as u8, utc.minute() as u8)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, hour, minute, 0).unwrap()
    }

    #[test]
    fn applies_base_offset() {
        assert_eq!(time_of_day_at(utc(9, 30), false), (19, 30));
    }

    #[test]
    fn extra_hour_shifts_by_one() {
        assert_eq!(time_of_day_at(utc(9, 30), true), (20, 30));
    }

    #[test]
    fn wraps_past_midnight() {
        assert_eq!(time_of_day_at(utc(23, 40), false), (9, 40));
        assert_eq!(time_of_day_at(utc(13, 0), true), (0, 0));
        assert_eq!(time_of_day_at(utc(14, 0), false), (0, 0));
    }

    #[test]
    fn sync_adjusts_reported_time() {
        let clock = SyncedClock::new();
        clock.apply_sync(Utc::now() + Duration::hours(1));

        let correction = clock.correction_ms();
        assert!((3_599_000..=3_601_000).contains(&correction));

        let skew = clock.now_utc().signed_duration_since(Utc::now());
        assert!(skew.num_seconds() >= 3_599);
    }

    #[test]
    fn unsynced_clock_tracks_system_time() {
        let clock = SyncedClock::new();
        let skew = clock.now_utc().signed_duration_since(Utc::now());
        assert!(skew.num_seconds().abs() < 1);
    }
}
