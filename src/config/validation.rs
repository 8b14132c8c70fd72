//! Configuration validation.
//!
//! Rejects values the scheduler cannot work with (out-of-range numbers,
//! inverted sequence bounds, unknown daylight-saving regions, an empty
//! outlet list) before they reach schedule generation.

use std::fmt::Display;

use super::Config;
use crate::constants::*;
use crate::time::calendar::{self, TimeError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    #[error("unknown configuration field '{0}'")]
    UnknownField(String),

    #[error("{field} ({value}) must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("min_sequences ({min}) must not exceed max_sequences ({max})")]
    SequenceOrder { min: u32, max: u32 },

    #[error("at least one outlet must be configured")]
    NoOutlets,

    #[error(transparent)]
    UnsupportedRegion(#[from] TimeError),
}

fn check_range<T: PartialOrd + Display>(
    field: &'static str,
    value: T,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Validate every field of `config`, returning the first problem found.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    check_range(
        "start_hour",
        config.start_hour,
        MINIMUM_START_HOUR,
        MAXIMUM_START_HOUR,
    )?;
    check_range(
        "start_minute",
        config.start_minute,
        MINIMUM_START_MINUTE,
        MAXIMUM_START_MINUTE,
    )?;
    check_range(
        "duration_minutes",
        config.duration_minutes,
        MINIMUM_DURATION_MINUTES,
        MAXIMUM_DURATION_MINUTES,
    )?;
    check_range(
        "on_percent",
        config.on_percent,
        MINIMUM_ON_PERCENT,
        MAXIMUM_ON_PERCENT,
    )?;
    check_range(
        "max_jitter_minutes",
        config.max_jitter_minutes,
        MINIMUM_JITTER_MINUTES,
        MAXIMUM_JITTER_MINUTES,
    )?;
    check_range(
        "min_sequences",
        config.min_sequences,
        MINIMUM_SEQUENCES,
        MAXIMUM_SEQUENCES,
    )?;
    check_range(
        "max_sequences",
        config.max_sequences,
        MINIMUM_SEQUENCES,
        MAXIMUM_SEQUENCES,
    )?;
    if config.min_sequences > config.max_sequences {
        return Err(ConfigError::SequenceOrder {
            min: config.min_sequences,
            max: config.max_sequences,
        });
    }

    // NaN fails both comparisons, so reject it explicitly
    if config.latitude.is_nan() || config.longitude.is_nan() {
        return Err(ConfigError::InvalidValue {
            field: "coordinates".to_string(),
            value: "NaN".to_string(),
        });
    }
    check_range(
        "latitude",
        config.latitude,
        MINIMUM_LATITUDE,
        MAXIMUM_LATITUDE,
    )?;
    check_range(
        "longitude",
        config.longitude,
        MINIMUM_LONGITUDE,
        MAXIMUM_LONGITUDE,
    )?;
    check_range(
        "utc_offset_hours",
        config.utc_offset_hours,
        MINIMUM_UTC_OFFSET_HOURS,
        MAXIMUM_UTC_OFFSET_HOURS,
    )?;
    calendar::parse_region(&config.dst_region)?;

    check_range(
        "display_timeout_minutes",
        config.display_timeout_minutes,
        0,
        MAXIMUM_DISPLAY_TIMEOUT_MINUTES,
    )?;

    if config.outlets.is_empty() {
        return Err(ConfigError::NoOutlets);
    }
    for outlet in &config.outlets {
        if outlet.address.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("outlets.{}.address", outlet.name),
                value: outlet.address.clone(),
            });
        }
    }

    Ok(())
}
