//! Calendar arithmetic on plain second-resolution timestamps.
//!
//! Timestamps handled here are seconds since the Unix epoch in whatever frame
//! the caller works in (UTC for clock sources, the local civil frame for
//! schedules). Calendar fields are always read as if the timestamp were UTC,
//! so a local-frame timestamp yields local wall-clock fields.
//!
//! Daylight-saving windows are evaluated from the fixed rules of each
//! [`DstRegion`] rather than from a timezone database.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::str::FromStr;

use crate::constants::{DST_REGION_NONE, SECONDS_PER_HOUR};

/// Seconds since the Unix epoch.
pub type Timestamp = i64;

/// Weekday names indexed Monday first, matching `Weekday::num_days_from_monday`.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("unsupported daylight saving region '{0}' (expected \"EU\" or \"NA\")")]
    UnsupportedRegion(String),
}

/// Break a timestamp into calendar fields.
///
/// Out-of-range timestamps collapse to the epoch; every value a clock or
/// schedule can produce lies far inside chrono's range.
pub fn civil(ts: Timestamp) -> NaiveDateTime {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Timestamp of `hour:minute` on `date` in the same frame as the date.
pub fn timestamp_of(date: NaiveDate, hour: u32, minute: u32) -> Timestamp {
    let midnight = date.and_time(NaiveTime::default()).and_utc().timestamp();
    midnight + i64::from(hour) * SECONDS_PER_HOUR + i64::from(minute) * 60
}

/// Render as weekday name plus zero-padded `HH:MM.SS`, e.g. `Fri 19:05.07`.
pub fn format_timestamp(ts: Timestamp) -> String {
    let dt = civil(ts);
    format!(
        "{} {:02}:{:02}.{:02}",
        WEEKDAYS[dt.weekday().num_days_from_monday() as usize],
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Zero-padded day of month and three-letter month, e.g. `06 Aug`.
pub fn day_month_label(ts: Timestamp) -> String {
    let dt = civil(ts);
    format!("{:02} {}", dt.day(), MONTHS[dt.month0() as usize])
}

/// `HH:MM:SS`, used for log prefixes.
pub fn clock_label(ts: Timestamp) -> String {
    civil(ts).format("%H:%M:%S").to_string()
}

/// Supported daylight-saving rule sets.
///
/// See <https://en.wikipedia.org/wiki/Daylight_saving_time_by_country>.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstRegion {
    /// EU and UK: last Sunday of March 01:00 until last Sunday of October 02:00.
    Eu,
    /// United States and Canada: second Sunday of March 02:00 until first Sunday of November 02:00.
    NorthAmerica,
}

impl FromStr for DstRegion {
    type Err = TimeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "EU" => Ok(DstRegion::Eu),
            "NA" => Ok(DstRegion::NorthAmerica),
            other => Err(TimeError::UnsupportedRegion(other.to_string())),
        }
    }
}

impl DstRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            DstRegion::Eu => "EU",
            DstRegion::NorthAmerica => "NA",
        }
    }

    /// DST `[start, end)` for `year`, in the frame of the timestamps being tested.
    pub fn window(&self, year: i32) -> (Timestamp, Timestamp) {
        match self {
            DstRegion::Eu => (
                timestamp_of(last_sunday(year, 3), 1, 0),
                timestamp_of(last_sunday(year, 10), 2, 0),
            ),
            DstRegion::NorthAmerica => (
                timestamp_of(nth_sunday(year, 3, 2), 2, 0),
                timestamp_of(nth_sunday(year, 11, 1), 2, 0),
            ),
        }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        let (start, end) = self.window(civil(ts).year());
        ts >= start && ts < end
    }
}

/// Parse an optional region tag, where `"none"` or an empty tag disables DST.
pub fn parse_region(tag: &str) -> Result<Option<DstRegion>, TimeError> {
    if tag.is_empty() || tag.eq_ignore_ascii_case(DST_REGION_NONE) {
        Ok(None)
    } else {
        tag.parse().map(Some)
    }
}

/// DST start and end timestamps for `year` under the rules named by `region`.
pub fn dst_window(year: i32, region: &str) -> Result<(Timestamp, Timestamp), TimeError> {
    Ok(region.parse::<DstRegion>()?.window(year))
}

/// Whether `ts` falls inside that year's DST window for `region`.
pub fn is_dst(ts: Timestamp, region: &str) -> Result<bool, TimeError> {
    Ok(region.parse::<DstRegion>()?.contains(ts))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

/// Last Sunday of `month`: day 1 of the following month, walked back to the prior Sunday.
fn last_sunday(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    };
    let back = i64::from(next_month.weekday().num_days_from_sunday());
    next_month - Duration::days(if back == 0 { 7 } else { back })
}

/// `n`th Sunday of `month` (1-based): first Sunday on or after day 1, plus `n - 1` weeks.
fn nth_sunday(year: i32, month: u32, n: u32) -> NaiveDate {
    let first = first_of_month(year, month);
    let forward = i64::from((7 - first.weekday().num_days_from_sunday()) % 7);
    first + Duration::days(forward + 7 * i64::from(n.saturating_sub(1)))
}
