//! Set command: update configuration fields from the command line.
//!
//! Values go through the same validation as the running scheduler's update
//! path. A running instance picks up the saved file through its watcher.

use anyhow::Result;

use crate::config::{self, Config, UPDATABLE_FIELDS};
use crate::io::lock::{default_lock_path, read_lock_pid};

/// Handle the set command - update configuration fields
pub fn handle_set_command(fields: &[(String, String)]) -> Result<()> {
    log_version!();

    let current = Config::load()?;
    let updated = match current.with_updates(fields) {
        Ok(updated) => updated,
        Err(e) => {
            log_pipe!();
            log_error!("{}", e);
            log_indented!("Settable fields: {}", UPDATABLE_FIELDS.join(", "));
            anyhow::bail!("Configuration validation failed");
        }
    };

    if updated == current {
        log_block_start!("Configuration unchanged");
        log_indented!("All fields already have the specified values");
        log_end!();
        return Ok(());
    }

    config::save(&updated)?;
    log_block_start!("Updated configuration");
    for (field, value) in fields {
        log_indented!("{} = {}", field, value.trim());
    }
    log_indented!("in {}", config::get_config_path()?.display());

    match read_lock_pid(&default_lock_path()) {
        Some(pid) => log_block_start!("Running instance will reschedule (PID: {})", pid),
        None => log_block_start!("Start plugtimer to apply the new configuration"),
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("set - Update configuration field(s)");
    log_block_start!("Usage: plugtimer set <field>=<value> [<field>=<value>...]");
    log_block_start!("Fields:");
    for field in UPDATABLE_FIELDS {
        log_indented!("{}", field);
    }
    log_block_start!("Examples:");
    log_indented!("plugtimer set on_percent=60");
    log_indented!("plugtimer set use_sunset=false start_hour=20 start_minute=30");
    log_end!();
}
