//! Simulate command: run the control loop against a simulated clock.
//!
//! Outlets are replaced by the dry-run transport, so a day of switching can
//! be inspected in seconds without touching any device.

use anyhow::{Result, anyhow};
use std::sync::Arc;

use crate::plugtimer::Plugtimer;
use crate::time::SimulatedClock;
use crate::time::source::parse_datetime;

/// Build the simulated clock for `start_time..end_time` (UTC, `YYYY-MM-DD HH:MM:SS`).
pub fn simulated_clock(start_time: &str, end_time: &str, multiplier: f64) -> Result<SimulatedClock> {
    let start = parse_datetime(start_time).map_err(|e| anyhow!("Invalid start time: {e}"))?;
    let end = parse_datetime(end_time).map_err(|e| anyhow!("Invalid end time: {e}"))?;
    if end <= start {
        anyhow::bail!("End time must be after start time");
    }
    Ok(SimulatedClock::new(start, end, multiplier))
}

pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: f64,
    debug_enabled: bool,
) -> Result<()> {
    let clock = simulated_clock(start_time, end_time, multiplier)?;
    Plugtimer::new(debug_enabled)
        .without_lock()
        .dry_run()
        .with_clock(Arc::new(clock))
        .run()
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Run against a simulated clock");
    log_block_start!("Usage: plugtimer simulate <start> <end> [multiplier]");
    log_block_start!("Arguments:");
    log_indented!("start, end   UTC times as \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("multiplier   Simulated seconds per real second (0 = as fast as possible)");
    log_block_start!("Examples:");
    log_indented!("plugtimer simulate \"2023-06-01 18:00:00\" \"2023-06-02 02:00:00\"");
    log_indented!("plugtimer simulate \"2023-06-01 18:00:00\" \"2023-06-01 22:00:00\" 600 --log sim.log");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ClockSource;

    #[test]
    fn test_simulated_clock_bounds() {
        let clock = simulated_clock("2023-06-01 18:00:00", "2023-06-01 19:00:00", 0.0).unwrap();
        assert_eq!(clock.utc_now(), 1_685_642_400);
        assert!(!clock.is_ended());
        assert!(simulated_clock("2023-06-01 19:00:00", "2023-06-01 18:00:00", 0.0).is_err());
        assert!(simulated_clock("yesterday", "2023-06-01 18:00:00", 0.0).is_err());
    }
}
