//! Configuration system for plugtimer with validation and hot reload.
//!
//! This module handles the TOML configuration file, validation, default
//! file generation and runtime updates from the `set` command.
//!
//! ## Configuration Source
//!
//! The configuration lives in `plugtimer.toml` under
//! `$XDG_CONFIG_HOME/plugtimer/` (or the directory passed with `--config`).
//! When no file exists a commented default is written and loaded.
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Schedule]
//! use_sunset = true          # Start each window at local sunset
//! start_hour = 19            # Fixed start hour when use_sunset is false (0-23)
//! start_minute = 0           # Fixed start minute when use_sunset is false (0-59)
//! duration_minutes = 60      # Length of the scheduling window (1-720)
//! on_percent = 80            # Share of the window the outlets are on (1-99)
//! max_jitter_minutes = 10    # Random variation applied to every segment (0-59)
//! min_sequences = 1          # Fewest on/off sequences per window (1-10)
//! max_sequences = 3          # Most on/off sequences per window (1-10)
//!
//! #[Location]
//! latitude = 51.5
//! longitude = -0.126
//! utc_offset_hours = 0
//! dst_region = "EU"          # "EU", "NA" or "none"
//!
//! #[Devices]
//! ntp_server = "pool.ntp.org"
//! transport = "kasa"         # "kasa" or "tasmota"
//! display_timeout_minutes = 1
//!
//! [[outlets]]
//! name = "lamp"
//! address = "192.168.1.100"
//! inverted = false
//! ```
//!
//! Every field is validated on load and on update; any change to a
//! scheduling field invalidates the current event queue.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;

pub use builder::{create_default_config, save, save_to_path};
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use validation::{ConfigError, validate_config};
pub use watcher::start_config_watcher;

/// Outlet-control protocol used to reach the configured devices.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// TP-Link Kasa plugs and strips (encrypted JSON over TCP 9999).
    Kasa,
    /// Tasmota firmware (HTTP `cm?cmnd=` interface).
    Tasmota,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Kasa => "kasa",
            Transport::Tasmota => "tasmota",
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kasa" => Ok(Transport::Kasa),
            "tasmota" => Ok(Transport::Tasmota),
            other => Err(ConfigError::InvalidValue {
                field: "transport".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// One controlled outlet. Its position in the list is its identifier.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutletConfig {
    pub name: String,
    /// Host name or IP address of the device.
    pub address: String,
    /// Child socket id on multi-outlet Kasa strips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    /// Relay logic is reversed on this outlet.
    #[serde(default)]
    pub inverted: bool,
}

impl Default for OutletConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_OUTLET_NAME.to_string(),
            address: DEFAULT_OUTLET_ADDRESS.to_string(),
            child_id: None,
            inverted: false,
        }
    }
}

/// Configuration for plugtimer, loaded from `plugtimer.toml`.
///
/// Missing keys fall back to their defaults, so a file only needs the
/// settings that differ.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub use_sunset: bool,
    pub start_hour: u32,
    pub start_minute: u32,
    pub duration_minutes: u32,
    pub on_percent: u32,
    pub max_jitter_minutes: u32,
    pub min_sequences: u32,
    pub max_sequences: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_hours: i32,
    pub dst_region: String,
    /// Empty trusts the system clock.
    pub ntp_server: String,
    pub transport: Transport,
    /// Minutes before the status display sleeps (0 = never).
    pub display_timeout_minutes: u32,
    pub outlets: Vec<OutletConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_sunset: DEFAULT_USE_SUNSET,
            start_hour: DEFAULT_START_HOUR,
            start_minute: DEFAULT_START_MINUTE,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            on_percent: DEFAULT_ON_PERCENT,
            max_jitter_minutes: DEFAULT_MAX_JITTER_MINUTES,
            min_sequences: DEFAULT_MIN_SEQUENCES,
            max_sequences: DEFAULT_MAX_SEQUENCES,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            dst_region: DEFAULT_DST_REGION.to_string(),
            ntp_server: DEFAULT_NTP_SERVER.to_string(),
            transport: Transport::Kasa,
            display_timeout_minutes: DEFAULT_DISPLAY_TIMEOUT_MINUTES,
            outlets: vec![OutletConfig::default()],
        }
    }
}

/// Keys accepted by [`Config::with_updates`].
pub const UPDATABLE_FIELDS: &[&str] = &[
    "use_sunset",
    "start_hour",
    "start_minute",
    "duration_minutes",
    "on_percent",
    "max_jitter_minutes",
    "min_sequences",
    "max_sequences",
    "latitude",
    "longitude",
    "utc_offset_hours",
    "dst_region",
    "ntp_server",
    "transport",
    "display_timeout_minutes",
];

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    /// Get configuration path using the module's get_config_path function
    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Apply `field=value` updates, returning the validated result.
    ///
    /// Fails with [`ConfigError::InvalidValue`] when a value does not parse
    /// for its field and [`ConfigError::UnknownField`] for unknown keys.
    /// `self` is never modified.
    pub fn with_updates<K, V>(&self, updates: &[(K, V)]) -> Result<Config, ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut updated = self.clone();
        for (field, value) in updates {
            let (field, value) = (field.as_ref(), value.as_ref());
            match field {
                "use_sunset" => updated.use_sunset = parse_flag(field, value)?,
                "start_hour" => updated.start_hour = parse_field(field, value)?,
                "start_minute" => updated.start_minute = parse_field(field, value)?,
                "duration_minutes" => updated.duration_minutes = parse_field(field, value)?,
                "on_percent" => updated.on_percent = parse_field(field, value)?,
                "max_jitter_minutes" => updated.max_jitter_minutes = parse_field(field, value)?,
                "min_sequences" => updated.min_sequences = parse_field(field, value)?,
                "max_sequences" => updated.max_sequences = parse_field(field, value)?,
                "latitude" => updated.latitude = parse_field(field, value)?,
                "longitude" => updated.longitude = parse_field(field, value)?,
                "utc_offset_hours" => updated.utc_offset_hours = parse_field(field, value)?,
                "dst_region" => updated.dst_region = value.trim().to_string(),
                "ntp_server" => updated.ntp_server = value.trim().to_string(),
                "transport" => updated.transport = value.trim().parse()?,
                "display_timeout_minutes" => {
                    updated.display_timeout_minutes = parse_field(field, value)?
                }
                other => return Err(ConfigError::UnknownField(other.to_string())),
            }
        }
        validate_config(&updated)?;
        Ok(updated)
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        if let Some(custom_dir) = get_custom_config_dir() {
            log_indented!("Directory: {}", custom_dir.display());
        }

        if self.use_sunset {
            let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
            let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
            log_indented!(
                "Start: sunset at {:.3}°{}, {:.3}°{}",
                self.latitude.abs(),
                lat_dir,
                self.longitude.abs(),
                lon_dir
            );
        } else {
            log_indented!("Start: {:02}:{:02}", self.start_hour, self.start_minute);
        }
        log_indented!(
            "Window: {} minutes, {}% on, ±{} minutes jitter",
            self.duration_minutes,
            self.on_percent,
            self.max_jitter_minutes
        );
        log_indented!(
            "Sequences: {}-{}",
            self.min_sequences,
            self.max_sequences
        );
        log_indented!(
            "Zone: UTC{:+} ({} daylight saving)",
            self.utc_offset_hours,
            self.dst_region
        );
        log_indented!(
            "Transport: {} with {} outlet(s)",
            self.transport.as_str(),
            self.outlets.len()
        );
        for (id, outlet) in self.outlets.iter().enumerate() {
            log_indented!(
                "  [{}] {} @ {}{}",
                id,
                outlet.name,
                outlet.address,
                if outlet.inverted { " (inverted)" } else { "" }
            );
        }
    }
}

#[cfg(test)]
mod tests;
