//! Sunset command: show the computed sunset for a date.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::Config;
use crate::time::{LocalTime, SystemClock, calendar};

/// Sunset on `date` (default today) at the configured location, as a local-frame timestamp.
pub fn sunset_for(config: &Config, time: &LocalTime, date: Option<&str>) -> Result<calendar::Timestamp> {
    let date = match date {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{text}', expected YYYY-MM-DD"))?,
        None => calendar::civil(time.now()).date(),
    };
    Ok(time.sunset_on(date, config.latitude, config.longitude))
}

pub fn handle_sunset_command(date: Option<&str>) -> Result<()> {
    log_version!();
    let config = Config::load()?;
    let time = LocalTime::from_config(Arc::new(SystemClock::new("")), &config);
    let sunset = sunset_for(&config, &time, date)?;

    log_block_start!(
        "Sunset on {}: {}",
        time.day_month_label(sunset),
        time.format(sunset)
    );
    log_indented!(
        "at {:.3}, {:.3} (UTC{:+}{})",
        config.latitude,
        config.longitude,
        config.utc_offset_hours,
        if time.is_dst_active() { ", daylight saving" } else { "" }
    );
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("sunset - Show the sunset time for a date");
    log_block_start!("Usage: plugtimer sunset [YYYY-MM-DD]");
    log_indented!("Uses latitude, longitude and zone settings from the configuration");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimulatedClock;

    #[test]
    fn test_sunset_for_explicit_date() {
        crate::logger::Log::set_enabled(false);
        let config = Config {
            dst_region: "none".into(),
            ..Config::default()
        };
        let time = LocalTime::from_config(Arc::new(SimulatedClock::starting_at(0)), &config);
        let sunset = sunset_for(&config, &time, Some("2022-08-26")).unwrap();
        let civil = calendar::civil(sunset);
        assert_eq!(civil.date(), NaiveDate::from_ymd_opt(2022, 8, 26).unwrap());
        assert_eq!(civil.format("%H").to_string(), "18");
        assert!(sunset_for(&config, &time, Some("26/08/2022")).is_err());
    }
}
