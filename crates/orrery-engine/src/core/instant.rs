//! Simulated time as fractional days since J2000.0.
//!
//! J2000.0 = January 1, 2000, 12:00 (Julian Day 2451545.0).
//! Kept in f64: a century is ~36525 days and we still want sub-second
//! resolution at that distance. Calendar conversion goes through `chrono`
//! and is proleptic Gregorian in both directions.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Julian Day of the J2000.0 epoch.
pub const J2000_JD: f64 = 2451545.0;

/// Days in a Julian century.
pub const DAYS_PER_CENTURY: f64 = 36525.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// 2000-01-01T12:00:00Z in Unix milliseconds.
const J2000_UNIX_MILLIS: i64 = 946_728_000_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A point in simulated time. Totally ordered (via `f64::total_cmp`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(f64);

impl Instant {
    pub const J2000: Instant = Instant(0.0);

    /// Earliest instant the clock will hold (around year -8950).
    pub const MIN: Instant = Instant(-4_000_000.0);
    /// Latest instant the clock will hold (late in year 9939).
    pub const MAX: Instant = Instant(2_900_000.0);

    pub const fn from_days(days_from_j2000: f64) -> Self {
        Self(days_from_j2000)
    }

    pub fn from_julian_day(jd: f64) -> Self {
        Self(jd - J2000_JD)
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self((datetime.timestamp_millis() - J2000_UNIX_MILLIS) as f64 / MS_PER_DAY)
    }

    /// Build an instant from a UTC calendar date. `None` for impossible dates.
    pub fn from_calendar(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        let datetime = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, 0)?
            .and_utc();
        Some(Self::from_datetime(datetime))
    }

    /// Convert Unix milliseconds (e.g. `Date.now()`) to an instant.
    pub fn from_unix_millis(millis: f64) -> Option<Self> {
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(millis.round() as i64).map(Self::from_datetime)
    }

    /// Parse a zero-padded `YYYY-MM-DD` (midnight UTC). Negative years are
    /// written with a leading sign (`-0500-03-01`). Rejects impossible dates
    /// and anything outside `MIN..=MAX`.
    pub fn parse_date(s: &str) -> Option<Self> {
        let s = s.trim();
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
        // chrono accepts unpadded fields; only the canonical spelling is a date
        if date.format(DATE_FORMAT).to_string() != s {
            return None;
        }
        let instant = Self::from_datetime(date.and_hms_opt(0, 0, 0)?.and_utc());
        instant.is_in_calendar_range().then_some(instant)
    }

    /// Days since J2000.0.
    pub fn days(self) -> f64 {
        self.0
    }

    pub fn julian_day(self) -> f64 {
        self.0 + J2000_JD
    }

    /// Julian centuries since J2000.0.
    pub fn centuries(self) -> f64 {
        self.0 / DAYS_PER_CENTURY
    }

    pub fn add_days(self, days: f64) -> Self {
        Self(self.0 + days)
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    pub fn is_in_calendar_range(self) -> bool {
        (Self::MIN.0..=Self::MAX.0).contains(&self.0)
    }

    /// Pull a finite instant into `MIN..=MAX`.
    pub fn clamp_to_calendar(self) -> Self {
        Self(self.0.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Linear blend between two instants; `t` is not clamped.
    pub fn lerp(self, other: Instant, t: f64) -> Self {
        Self(self.0 + (other.0 - self.0) * t)
    }

    /// UTC date/time, rounded to the millisecond. `None` outside the
    /// calendar range or for non-finite instants.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !self.is_finite() || !self.is_in_calendar_range() {
            return None;
        }
        let millis = (self.0 * MS_PER_DAY).round() as i64;
        DateTime::from_timestamp_millis(J2000_UNIX_MILLIS + millis)
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Instant {
    /// Formats as `YYYY-MM-DD`, or as a day offset outside the calendar range.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.format(DATE_FORMAT)),
            None => write!(f, "J2000{:+.1}d", self.0),
        }
    }
}
