//! Low-precision solar position series for sunset times.
//!
//! Implements the NOAA-style approximation: Julian century, obliquity,
//! equation of time and solar declination feed an hour-angle formula that
//! yields the UTC time the sun's centre sinks [`SUNSET_DEPRESSION_DEGREES`]
//! below the horizon. Accuracy is around a minute at mid latitudes, which is
//! plenty for anchoring a lighting schedule.
//!
//! Everything here is a pure function of its arguments.

use crate::constants::{LATITUDE_LIMIT, SUNSET_DEPRESSION_DEGREES};

/// Julian date of the first day of the Gregorian calendar (1582-10-15).
const GREGORIAN_ADOPTION: f64 = 2_299_160.499_999_9;
/// Julian date of the J2000.0 epoch.
const J2000: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Julian date at 00:00 UTC of the given calendar date.
///
/// January and February are folded into the previous year as months 13 and
/// 14; the Gregorian correction applies from 15 October 1582 onwards.
pub fn julian_day(day: u32, month: u32, year: i32) -> f64 {
    let (mut year, mut month) = (f64::from(year), f64::from(month));
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    let jd = (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor()
        + f64::from(day)
        - 1524.5;

    if jd > GREGORIAN_ADOPTION { jd + b } else { jd }
}

fn julian_century(julian_day: f64) -> f64 {
    (julian_day - J2000) / DAYS_PER_CENTURY
}

fn century_to_julian_day(century: f64) -> f64 {
    century * DAYS_PER_CENTURY + J2000
}

fn mean_obliquity_of_ecliptic(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    23.0 + (26.0 + seconds / 60.0) / 60.0
}

/// Longitude of the moon's ascending node, driving nutation terms.
fn ascending_node(t: f64) -> f64 {
    125.04 - 1934.136 * t
}

fn obliquity_correction(t: f64) -> f64 {
    mean_obliquity_of_ecliptic(t) + 0.00256 * ascending_node(t).to_radians().cos()
}

fn geom_mean_long_sun(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + 0.0003032 * t)).rem_euclid(360.0)
}

fn eccentricity_earth_orbit(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + 0.0000001267 * t)
}

fn geom_mean_anomaly_sun(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - 0.0001537 * t)
}

/// Equation of time in minutes.
fn equation_of_time(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let l0 = geom_mean_long_sun(t).to_radians();
    let e = eccentricity_earth_orbit(t);
    let m = geom_mean_anomaly_sun(t).to_radians();

    let y = (epsilon / 2.0).tan().powi(2);

    let etime = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();

    etime.to_degrees() * 4.0
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly_sun(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let true_longitude = geom_mean_long_sun(t) + sun_equation_of_center(t);
    true_longitude - 0.00569 - 0.00478 * ascending_node(t).to_radians().sin()
}

/// Solar declination in degrees.
fn sun_declination(t: f64) -> f64 {
    let sin_dec =
        obliquity_correction(t).to_radians().sin() * sun_apparent_longitude(t).to_radians().sin();
    sin_dec.asin().to_degrees()
}

/// Hour angle (radians) at which the sun sits `depression` degrees below the horizon.
///
/// The cosine is clamped so polar day and polar night degrade to the
/// nearest real solution instead of producing NaN.
fn hour_angle(latitude: f64, declination: f64, depression: f64) -> f64 {
    let lat = latitude.to_radians();
    let dec = declination.to_radians();
    let cos_ha =
        (90.0 + depression).to_radians().cos() / (lat.cos() * dec.cos()) - lat.tan() * dec.tan();
    cos_ha.clamp(-1.0, 1.0).acos()
}

/// Minutes after 00:00 UTC at which the sun sets, given the solar values at century `t`.
fn sunset_minutes_utc(t: f64, latitude: f64, longitude: f64) -> f64 {
    let eq_time = equation_of_time(t);
    let declination = sun_declination(t);
    let ha = -hour_angle(latitude, declination, SUNSET_DEPRESSION_DEGREES);
    let delta = -longitude - ha.to_degrees();
    720.0 + 4.0 * delta - eq_time
}

/// Sunset as `(hour, minute)` UTC on the given Julian day.
///
/// Runs two passes: a coarse estimate at 00:00 UTC, then a refinement with
/// declination and equation of time re-evaluated at the estimated sunset.
pub fn sunset(julian_day: f64, latitude: f64, longitude: f64) -> (i32, i32) {
    let latitude = latitude.clamp(-LATITUDE_LIMIT, LATITUDE_LIMIT);

    let t = julian_century(julian_day);
    let estimate = sunset_minutes_utc(t, latitude, longitude);

    let refined_t = julian_century(century_to_julian_day(t) + estimate / MINUTES_PER_DAY);
    let minutes = sunset_minutes_utc(refined_t, latitude, longitude);

    split_hours(minutes / 60.0)
}

/// Split fractional hours into whole hours and minutes, carrying seconds upward.
fn split_hours(time: f64) -> (i32, i32) {
    let mut hour = time.trunc() as i32;
    let fraction_minutes = (time - f64::from(hour)) * 60.0;
    let mut minute = fraction_minutes.trunc() as i32;
    let second = ((fraction_minutes - f64::from(minute)) * 60.0).trunc() as i32;

    if second > 59 {
        minute += 1;
    } else if second < 0 {
        minute -= 1;
    }

    if minute > 59 {
        minute -= 60;
        hour += 1;
    } else if minute < 0 {
        minute += 60;
        hour -= 1;
    }

    (hour, minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;

    #[test]
    fn test_julian_day_known_dates() {
        assert_eq!(julian_day(26, 8, 2022), 2_459_817.5);
        assert_eq!(julian_day(1, 1, 2000), 2_451_544.5);
        // Before the Gregorian reform no correction term is applied
        assert_eq!(julian_day(4, 10, 1582), 2_299_159.5);
        assert_eq!(julian_day(15, 10, 1582), 2_299_160.5);
    }

    #[test]
    fn test_london_sunset_late_august() {
        let jd = julian_day(26, 8, 2022);
        let (hour, minute) = sunset(jd, TEST_LONDON_LATITUDE, TEST_LONDON_LONGITUDE);
        // Published sunset: 19:57 BST, i.e. 18:57 UTC
        assert_eq!(hour, 18);
        assert!((50..=59).contains(&minute), "got 18:{minute:02}");
    }

    #[test]
    fn test_sunset_is_deterministic() {
        let jd = julian_day(26, 8, 2022);
        let first = sunset(jd, 51.5, -0.126);
        for _ in 0..10 {
            assert_eq!(sunset(julian_day(26, 8, 2022), 51.5, -0.126), first);
        }
    }

    #[test]
    fn test_new_york_winter_sunset() {
        let jd = julian_day(21, 12, 2023);
        let (hour, minute) = sunset(jd, TEST_NEW_YORK_LATITUDE, TEST_NEW_YORK_LONGITUDE);
        // Published sunset: 16:32 EST, i.e. 21:32 UTC
        let total = hour * 60 + minute;
        assert!((21 * 60 + 27..=21 * 60 + 37).contains(&total), "got {hour}:{minute:02}");
    }

    #[test]
    fn test_polar_latitudes_do_not_produce_nan() {
        let jd = julian_day(21, 6, 2023);
        for latitude in [90.0, 89.9, -90.0, 78.2] {
            let (hour, minute) = sunset(jd, latitude, 15.6);
            assert!((-1..=25).contains(&hour), "hour {hour} at {latitude}");
            assert!((0..60).contains(&minute));
        }
    }

    #[test]
    fn test_split_hours_carries() {
        assert_eq!(split_hours(18.5), (18, 30));
        assert_eq!(split_hours(19.0), (19, 0));
        assert_eq!(split_hours(7.999), (7, 59));
    }
}
