use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// An instant on the service day, stored as signed milliseconds from midnight.
///
/// Schedules past midnight (e.g. `25:10:00`) are representable, as are
/// instants pushed before midnight by walk-time arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    pub const MIN: Time = Time(i64::MIN);
    pub const MAX: Time = Time(i64::MAX);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn from_seconds(secs: i64) -> Self {
        Self(secs * 1000)
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes * 60 * 1000)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    pub const fn as_seconds(&self) -> i64 {
        self.0 / 1000
    }

    /// Parses a `HH:MM:SS` clock string. Hours may exceed 23 for trips that
    /// run past midnight.
    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: i64 = 60 * 60;
        const MINUTE_TO_SEC: i64 = 60;
        let mut split = time.split(':');
        let hours: i64 = split.next()?.parse().ok()?;
        let minutes: i64 = split.next()?.parse().ok()?;
        let seconds: i64 = split.next()?.parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        Some(Self::from_seconds(
            hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds,
        ))
    }

    pub fn to_hms_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let secs = (self.0 / 1000).abs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        let s = secs % 60;
        format!("{}{:02}:{:02}:{:02}", sign, h, m, s)
    }

    /// Anchors this instant to a concrete service day.
    pub fn on_day(&self, day: NaiveDate) -> NaiveDateTime {
        let midnight = day.and_time(NaiveTime::default());
        midnight + chrono::Duration::milliseconds(self.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hms_string())
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Sub<Duration> for Time {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign<Duration> for Time {
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs.0
    }
}

/// A signed span of time, stored as milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn from_seconds(secs: i64) -> Self {
        Self(secs * 1000)
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes * 60 * 1000)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    pub const fn as_seconds(&self) -> i64 {
        self.0 / 1000
    }

    /// Fractional minutes, the unit every path cost is expressed in.
    pub fn as_minutes(&self) -> f64 {
        self.0 as f64 / 60_000.0
    }
}

impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

#[test]
fn parse_unparse_1() {
    let time = "00:00:00";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_2() {
    let time = "07:35:30";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_3() {
    let time = "25:10:00";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn valid_time_test_1() {
    let time = "00:01:30";
    assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 90);
}

#[test]
fn valid_time_test_2() {
    let time = "01:01:30";
    assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 3690);
}

#[test]
fn invalid_time_test_1() {
    let time = "00:00:0a";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn invalid_time_test_2() {
    let time = "00:00";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn negative_time_test() {
    let time = Time::from_minutes(5) - Duration::from_minutes(10);
    assert_eq!(time.as_seconds(), -300);
    assert_eq!(time.to_hms_string(), "-00:05:00");
}

#[test]
fn duration_minutes_test() {
    let d = Time::from_hms("07:55:00").unwrap() - Time::from_hms("07:40:00").unwrap();
    assert_eq!(d.as_minutes(), 15.0);
}
