//! Command-line argument parsing and processing.
//!
//! Global flags may appear anywhere on the command line. The first
//! positional argument selects a command; everything after it belongs to
//! that command.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the timer loop
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Preview the schedule that would be generated now
    ScheduleCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
    },
    /// Show the sunset time for a date
    SunsetCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        date: Option<String>,
    },
    /// Update configuration field(s)
    SetCommand {
        debug_enabled: bool,
        fields: Vec<(String, String)>,
        config_dir: Option<String>,
    },
    /// Run the loop on a simulated clock with dry-run outlets
    SimulateCommand {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        multiplier: f64,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Help for a specific command, or general help
    HelpCommand { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    fn error() -> ParsedArgs {
        ParsedArgs {
            action: CliAction::ShowHelpDueToError,
        }
    }

    /// Parse command-line arguments into a structured result.
    ///
    /// `args` includes the program name, as from `std::env::args()`.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = &args_vec[i];
            match arg_str.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--json" => json = true,
                "--config" | "-c" | "--log" => {
                    let Some(value) = args_vec.get(i + 1).filter(|v| !v.starts_with('-')) else {
                        log_warning!("Missing value for {}", arg_str);
                        return Self::error();
                    };
                    if arg_str == "--log" {
                        log_file = Some(value.clone());
                    } else {
                        config_dir = Some(value.clone());
                    }
                    i += 1;
                }
                other if other.starts_with('-') && other.parse::<f64>().is_err() => {
                    log_warning!("Unknown argument: {}", other);
                    return Self::error();
                }
                _ => positionals.push(arg_str.clone()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let Some((command, rest)) = positionals.split_first() else {
            return ParsedArgs {
                action: CliAction::Run {
                    debug_enabled,
                    config_dir,
                    log_file,
                },
            };
        };

        let action = match command.as_str() {
            "schedule" | "S" => {
                if !rest.is_empty() {
                    log_warning!("schedule takes no arguments");
                    return Self::error();
                }
                CliAction::ScheduleCommand {
                    debug_enabled,
                    config_dir,
                    json,
                }
            }
            "sunset" | "u" => {
                if rest.len() > 1 {
                    log_warning!("Usage: plugtimer sunset [YYYY-MM-DD]");
                    return Self::error();
                }
                CliAction::SunsetCommand {
                    debug_enabled,
                    config_dir,
                    date: rest.first().cloned(),
                }
            }
            "set" | "s" => {
                let mut fields = Vec::new();
                for pair in rest {
                    match pair.split_once('=') {
                        Some((field, value)) if !field.is_empty() => {
                            fields.push((field.trim().to_string(), value.to_string()))
                        }
                        _ => {
                            log_warning!("Expected <field>=<value>, got '{}'", pair);
                            return Self::error();
                        }
                    }
                }
                if fields.is_empty() {
                    log_warning!(
                        "Missing field. Usage: plugtimer set <field>=<value> [<field>=<value>...]"
                    );
                    return Self::error();
                }
                CliAction::SetCommand {
                    debug_enabled,
                    fields,
                    config_dir,
                }
            }
            "simulate" | "m" => {
                let (start_time, end_time) = match rest {
                    [start, end] | [start, end, _] => (start.clone(), end.clone()),
                    _ => {
                        log_warning!(
                            "Usage: plugtimer simulate <start> <end> [multiplier]"
                        );
                        return Self::error();
                    }
                };
                let multiplier = match rest.get(2).map(|m| m.parse::<f64>()) {
                    None => 0.0,
                    Some(Ok(m)) if m >= 0.0 => m,
                    Some(_) => {
                        log_warning!("Invalid multiplier: {}", rest[2]);
                        return Self::error();
                    }
                };
                CliAction::SimulateCommand {
                    debug_enabled,
                    start_time,
                    end_time,
                    multiplier,
                    config_dir,
                    log_file,
                }
            }
            "help" | "h" => CliAction::HelpCommand {
                command: rest.first().cloned(),
            },
            _ => {
                log_warning!("Unknown command: {}", command);
                return Self::error();
            }
        };

        ParsedArgs { action }
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("plugtimer [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("    --log <file>       Also write output to a file");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("schedule, S [--json]   Preview the next schedule");
    log_indented!("sunset, u [date]       Show the sunset time for a date");
    log_indented!("set, s <field>=<value> Update configuration field(s)");
    log_indented!("simulate, m <start> <end> [multiplier]");
    log_indented!("                       Run against a simulated clock");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}
