//! Wall-clock reading and the per-frame time snapshot.
//!
//! This module provides:
//! - `TimeZone`, a fixed UTC offset applied when a timestamp is split into hours/minutes
//! - `ClockReading`, the immutable snapshot the renderer draws from
//! - the `WallClock` trait and `SoftClock`, a software clock seeded once from the RTC
//! - `MinuteTicker`, the once-a-minute tick source used by the firmware host
//!
//! Angles follow the usual clock-face convention: 0 degrees is twelve o'clock and
//! angles grow clockwise.

use core::fmt::Write;

use heapless::String;

use crate::config::FaceConfig;

const SECS_PER_DAY: i64 = 86_400;

/// Fixed offset from UTC, in seconds. East of Greenwich is positive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeZone {
    offset_secs: i32,
}

impl TimeZone {
    pub const UTC: TimeZone = TimeZone { offset_secs: 0 };

    pub const fn from_offset_secs(offset_secs: i32) -> Self {
        Self { offset_secs }
    }

    pub const fn from_offset_minutes(minutes: i32) -> Self {
        Self { offset_secs: minutes * 60 }
    }

    #[inline]
    pub const fn offset_secs(&self) -> i32 {
        self.offset_secs
    }
}

/// Hour, minute and second of the local time at draw time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockReading {
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

impl ClockReading {
    /// Build a reading, wrapping each field into its range.
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour: hour % 24,
            minute: minute % 60,
            second: second % 60,
        }
    }

    /// Split a unix timestamp into local time-of-day.
    pub fn from_unix(unix_secs: u64, zone: TimeZone) -> Self {
        let local = unix_secs as i64 + zone.offset_secs as i64;
        // rem_euclid keeps negative offsets before the epoch/midnight in range
        let of_day = local.rem_euclid(SECS_PER_DAY);
        Self {
            hour: (of_day / 3600) as u8,
            minute: ((of_day % 3600) / 60) as u8,
            second: (of_day % 60) as u8,
        }
    }

    /// Night is any hour outside the configured day window.
    #[inline]
    pub fn is_night(&self, cfg: &FaceConfig) -> bool {
        cfg.is_night_hour(self.hour)
    }

    /// Rotation of the hour pupil in degrees.
    ///
    /// The minute contributes half a degree per minute so the pupil drifts
    /// continuously through the hour instead of jumping.
    #[inline]
    pub fn hour_angle(&self) -> f32 {
        (self.hour % 12) as f32 * 30.0 + self.minute as f32 / 2.0
    }

    /// Rotation of the minute pupil in degrees (360 / 60 = 6 per minute).
    #[inline]
    pub fn minute_angle(&self) -> f32 {
        self.minute as f32 * 6.0
    }

    /// Zero-padded 24-hour `HH:MM`.
    pub fn format_hhmm(&self) -> String<5> {
        let mut out = String::new();
        // 5 bytes always fit, hour and minute are range-checked on construction
        write!(out, "{:02}:{:02}", self.hour, self.minute).ok();
        out
    }
}

/// Source of the current time, in unix seconds.
pub trait WallClock {
    fn unix_seconds(&mut self) -> u64;
}

impl<C: WallClock + ?Sized> WallClock for &mut C {
    fn unix_seconds(&mut self) -> u64 {
        (**self).unix_seconds()
    }
}

/// Software clock: a unix base captured at some uptime, advanced by a monotonic
/// millisecond counter.
///
/// On the board the base comes from the PCF85063 at boot and the counter is the
/// system timer, so the I2C bus is not touched every frame.
pub struct SoftClock {
    base_unix: u64,
    base_uptime_ms: u64,
    uptime_ms: fn() -> u64,
}

impl SoftClock {
    /// A clock reading the epoch until it is set.
    pub fn new(uptime_ms: fn() -> u64) -> Self {
        Self {
            base_unix: 0,
            base_uptime_ms: uptime_ms(),
            uptime_ms,
        }
    }

    /// A clock starting at `unix_secs` now.
    pub fn starting_at(unix_secs: u64, uptime_ms: fn() -> u64) -> Self {
        let mut clock = Self::new(uptime_ms);
        clock.set_unix_seconds(unix_secs);
        clock
    }

    /// Re-base the clock so that "now" reads `unix_secs`.
    pub fn set_unix_seconds(&mut self, unix_secs: u64) {
        self.base_unix = unix_secs;
        self.base_uptime_ms = (self.uptime_ms)();
    }
}

impl WallClock for SoftClock {
    fn unix_seconds(&mut self) -> u64 {
        let elapsed_ms = (self.uptime_ms)().saturating_sub(self.base_uptime_ms);
        self.base_unix + elapsed_ms / 1000
    }
}

/// Fires once per wall-clock minute, for hosts without a system time tick.
#[derive(Debug, Default)]
pub struct MinuteTicker {
    last_minute: Option<u64>,
}

impl MinuteTicker {
    pub const fn new() -> Self {
        Self { last_minute: None }
    }

    /// True the first time it is polled and whenever the minute has rolled over.
    pub fn poll(&mut self, unix_secs: u64) -> bool {
        let minute = unix_secs / 60;
        if self.last_minute == Some(minute) {
            return false;
        }
        self.last_minute = Some(minute);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn afternoon_reading_angles() {
        let r = ClockReading::new(14, 30, 0);
        assert_eq!(r.hour_angle(), 75.0);
        assert_eq!(r.minute_angle(), 180.0);
        assert!(!r.is_night(&FaceConfig::default()));
    }

    #[test]
    fn angles_stay_in_range_for_every_minute_of_the_day() {
        for hour in 0..24u8 {
            for minute in 0..60u8 {
                let r = ClockReading::new(hour, minute, 0);
                let h = r.hour_angle();
                let m = r.minute_angle();
                assert!((0.0..360.0).contains(&h), "{hour}:{minute} -> {h}");
                assert!((0.0..=354.0).contains(&m), "{hour}:{minute} -> {m}");
            }
        }
    }

    #[test]
    fn hour_angle_advances_within_the_hour() {
        let early = ClockReading::new(3, 0, 0).hour_angle();
        let late = ClockReading::new(3, 59, 0).hour_angle();
        assert_eq!(early, 90.0);
        assert_eq!(late, 119.5);
    }

    #[test]
    fn night_boundaries() {
        let cfg = FaceConfig::default();
        assert!(ClockReading::new(5, 59, 0).is_night(&cfg));
        assert!(!ClockReading::new(6, 0, 0).is_night(&cfg));
        assert!(!ClockReading::new(17, 59, 0).is_night(&cfg));
        assert!(ClockReading::new(18, 0, 0).is_night(&cfg));
        assert!(ClockReading::new(0, 0, 0).is_night(&cfg));
    }

    #[test]
    fn night_follows_a_shifted_day_window() {
        let cfg = FaceConfig { day_start_hour: 8, day_end_hour: 20, ..FaceConfig::default() };
        assert!(ClockReading::new(7, 0, 0).is_night(&cfg));
        assert!(!ClockReading::new(19, 0, 0).is_night(&cfg));
        assert!(ClockReading::new(20, 0, 0).is_night(&cfg));
    }

    #[test]
    fn unix_split_applies_zone() {
        // 2024-01-01T23:30:15Z
        let ts = 1_704_151_815;
        assert_eq!(ClockReading::from_unix(ts, TimeZone::UTC), ClockReading::new(23, 30, 15));
        // +02:00 rolls into the next day
        let cest = TimeZone::from_offset_minutes(120);
        assert_eq!(ClockReading::from_unix(ts, cest), ClockReading::new(1, 30, 15));
    }

    #[test]
    fn negative_offset_before_midnight_wraps() {
        // 00:10 UTC at -05:00 is 19:10 the previous day
        let zone = TimeZone::from_offset_minutes(-300);
        assert_eq!(ClockReading::from_unix(600, zone), ClockReading::new(19, 10, 0));
    }

    #[test]
    fn hhmm_is_zero_padded() {
        assert_eq!(ClockReading::new(7, 5, 0).format_hhmm().as_str(), "07:05");
        assert_eq!(ClockReading::new(23, 59, 59).format_hhmm().as_str(), "23:59");
    }

    #[test]
    fn ticker_fires_once_per_minute() {
        let mut ticker = MinuteTicker::new();
        assert!(ticker.poll(120));
        assert!(!ticker.poll(121));
        assert!(!ticker.poll(179));
        assert!(ticker.poll(180));
        // clock set backwards still counts as a new minute
        assert!(ticker.poll(60));
    }

    static UPTIME: AtomicU64 = AtomicU64::new(0);

    fn fake_uptime() -> u64 {
        UPTIME.load(Ordering::Relaxed)
    }

    #[test]
    fn soft_clock_advances_with_uptime() {
        UPTIME.store(5_000, Ordering::Relaxed);
        let mut clock = SoftClock::starting_at(1_000, fake_uptime);
        assert_eq!(clock.unix_seconds(), 1_000);

        UPTIME.store(7_999, Ordering::Relaxed);
        assert_eq!(clock.unix_seconds(), 1_002);

        clock.set_unix_seconds(50);
        UPTIME.store(9_000, Ordering::Relaxed);
        assert_eq!(clock.unix_seconds(), 51);
    }
}
