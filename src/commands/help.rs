//! Help command dispatcher.

use anyhow::Result;

/// Run the help command for `command`, or general help when `None`.
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("help") | Some("h") => display_help_help(),
        Some("schedule") | Some("S") => super::schedule::display_help(),
        Some("set") | Some("s") => super::set::display_help(),
        Some("simulate") | Some("m") => super::simulate::display_help(),
        Some("sunset") | Some("u") => super::sunset::display_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("schedule, S [--json]           Preview the next schedule");
    log_indented!("sunset, u [YYYY-MM-DD]         Show the sunset time for a date");
    log_indented!("set, s <field>=<value>         Update configuration field(s)");
    log_indented!("simulate, m <start> <end> [x]  Run against a simulated clock");
    log_indented!("help, h [COMMAND]              Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'plugtimer help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'plugtimer --help' to see all options and general usage.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: plugtimer help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("plugtimer help");
    log_indented!("plugtimer help set");
    log_end!();
}
