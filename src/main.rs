//! Main application entry point.
//!
//! Parses the command line, applies global options (config directory, file
//! logging) and dispatches to the run loop or a one-shot command.

use anyhow::Result;
use plugtimer::args::{self, CliAction, ParsedArgs};
use plugtimer::constants::EXIT_FAILURE;
use plugtimer::logger::Log;
use plugtimer::{Plugtimer, commands, config, log_error_exit};

fn dispatch(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            let _log_guard = log_file.map(Log::start_file_logging).transpose()?;
            Plugtimer::new(debug_enabled).run()
        }
        CliAction::ScheduleCommand {
            config_dir, json, ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::schedule::handle_schedule_command(json)
        }
        CliAction::SunsetCommand {
            config_dir, date, ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::sunset::handle_sunset_command(date.as_deref())
        }
        CliAction::SetCommand {
            fields, config_dir, ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::set::handle_set_command(&fields)
        }
        CliAction::SimulateCommand {
            debug_enabled,
            start_time,
            end_time,
            multiplier,
            config_dir,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            let _log_guard = log_file.map(Log::start_file_logging).transpose()?;
            commands::simulate::handle_simulate_command(
                &start_time,
                &end_time,
                multiplier,
                debug_enabled,
            )
        }
    }
}

fn main() {
    let parsed_args = ParsedArgs::parse(std::env::args());
    if let Err(e) = dispatch(parsed_args.action) {
        log_error_exit!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }
}
