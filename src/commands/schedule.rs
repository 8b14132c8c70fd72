//! Schedule command: preview the events the timer would generate now.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::logger::Log;
use crate::outlet::DryRunOutlets;
use crate::schedule::{Event, Scheduler};
use crate::time::{LocalTime, SystemClock};

/// Generate a schedule against the system clock.
///
/// Each run draws fresh jitter, so the preview shows one possible schedule.
/// The events are logged in local time as they are generated.
pub fn preview(config: Config) -> Vec<Event> {
    let time = LocalTime::from_config(Arc::new(SystemClock::new("")), &config);
    let outlets = DryRunOutlets::new(config.outlets.clone());
    let mut scheduler = Scheduler::new(config);
    scheduler.regenerate(&time, &outlets);
    scheduler.queue().iter().cloned().collect()
}

pub fn handle_schedule_command(json: bool) -> Result<()> {
    if json {
        Log::set_enabled(false);
    } else {
        log_version!();
    }

    let config = Config::load()?;
    let events = preview(config);

    if json {
        let text = serde_json::to_string_pretty(&events).context("Failed to encode schedule")?;
        println!("{text}");
    } else {
        log_end!();
    }
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("schedule - Preview the next schedule");
    log_block_start!("Usage: plugtimer schedule [--json]");
    log_block_start!("Options:");
    log_indented!("--json  Print events as JSON (start, end, outlet, state, label)");
    log_end!();
}
