//! Configuration file building and saving.
//!
//! Renders a [`Config`] as commented TOML with aligned inline comments, used
//! both for the default file written on first run and for saving updates.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::{Config, get_config_path};
use crate::constants::*;

/// Write the default configuration to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    save_to_path(&Config::default(), path).context("Failed to write default config file")
}

/// Save `config` to the resolved configuration path.
pub fn save(config: &Config) -> Result<()> {
    save_to_path(config, &get_config_path()?)
}

/// Render `config` and write it to `path`.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    fs::write(path, render(config))
        .with_context(|| format!("Failed to write config to {}", path.display()))
}

fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Commented TOML text for `config`.
pub fn render(config: &Config) -> String {
    let mut builder = ConfigBuilder::new()
        .add_section("Schedule")
        .add_setting(
            "use_sunset",
            &config.use_sunset.to_string(),
            "Start each window at local sunset (false uses start_hour/start_minute)",
        )
        .add_setting(
            "start_hour",
            &config.start_hour.to_string(),
            &format!("Fixed start hour ({MINIMUM_START_HOUR}-{MAXIMUM_START_HOUR})"),
        )
        .add_setting(
            "start_minute",
            &config.start_minute.to_string(),
            &format!("Fixed start minute ({MINIMUM_START_MINUTE}-{MAXIMUM_START_MINUTE})"),
        )
        .add_setting(
            "duration_minutes",
            &config.duration_minutes.to_string(),
            &format!(
                "Length of the scheduling window ({MINIMUM_DURATION_MINUTES}-{MAXIMUM_DURATION_MINUTES}) minutes"
            ),
        )
        .add_setting(
            "on_percent",
            &config.on_percent.to_string(),
            &format!("Share of the window outlets are on ({MINIMUM_ON_PERCENT}-{MAXIMUM_ON_PERCENT}%)"),
        )
        .add_setting(
            "max_jitter_minutes",
            &config.max_jitter_minutes.to_string(),
            &format!(
                "Random variation per segment ({MINIMUM_JITTER_MINUTES}-{MAXIMUM_JITTER_MINUTES}) minutes"
            ),
        )
        .add_setting(
            "min_sequences",
            &config.min_sequences.to_string(),
            &format!("Fewest on/off sequences per window ({MINIMUM_SEQUENCES}-{MAXIMUM_SEQUENCES})"),
        )
        .add_setting(
            "max_sequences",
            &config.max_sequences.to_string(),
            &format!("Most on/off sequences per window ({MINIMUM_SEQUENCES}-{MAXIMUM_SEQUENCES})"),
        )
        .add_section("Location")
        .add_setting(
            "latitude",
            &format!("{:?}", config.latitude),
            "Geographic latitude for sunset (-90 to 90)",
        )
        .add_setting(
            "longitude",
            &format!("{:?}", config.longitude),
            "Geographic longitude for sunset (-180 to 180)",
        )
        .add_setting(
            "utc_offset_hours",
            &config.utc_offset_hours.to_string(),
            &format!(
                "Standard-time offset from UTC ({MINIMUM_UTC_OFFSET_HOURS} to {MAXIMUM_UTC_OFFSET_HOURS})"
            ),
        )
        .add_setting(
            "dst_region",
            &quoted(&config.dst_region),
            "Daylight saving rules: \"EU\", \"NA\" or \"none\"",
        )
        .add_section("Devices")
        .add_setting(
            "ntp_server",
            &quoted(&config.ntp_server),
            "Time server for clock sync (empty trusts the system clock)",
        )
        .add_setting(
            "transport",
            &quoted(config.transport.as_str()),
            "Outlet protocol: \"kasa\" or \"tasmota\"",
        )
        .add_setting(
            "display_timeout_minutes",
            &config.display_timeout_minutes.to_string(),
            "Status display sleeps after this many minutes (0 = never)",
        );

    for outlet in &config.outlets {
        builder = builder
            .add_table("outlets")
            .add_setting("name", &quoted(&outlet.name), "Label used in logs and status")
            .add_setting("address", &quoted(&outlet.address), "Device host name or IP address");
        if let Some(child_id) = &outlet.child_id {
            builder = builder.add_setting(
                "child_id",
                &quoted(child_id),
                "Socket id on multi-outlet Kasa strips",
            );
        }
        builder = builder.add_setting(
            "inverted",
            &outlet.inverted.to_string(),
            "Relay logic reversed (off energises the load)",
        );
    }

    builder.build()
}

/// Builder for formatted configuration files with aligned comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    /// `#[Title]` comment header.
    Section(String),
    /// `[[name]]` array-of-tables header.
    Table(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry::Table(format!("[[{name}]]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(header) | ConfigEntry::Table(header) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(header);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut text = result.join("\n");
        text.push('\n');
        text
    }
}
