//! Structured logging with box-drawing output.
//!
//! Every line plugtimer prints goes through the macros in this module so the
//! output keeps one visual style: a `┏` header, `┣`/`┃` body lines and a `╹`
//! terminator. Semantic levels (`[INFO]`, `[WARNING]`, ...) are colored.
//!
//! ## Logging Conventions
//!
//! - **`log_block_start!`** opens a new conceptual block (`┃` spacer then `┣ message`).
//! - **`log_decorated!`** continues a block (`┣ message`).
//! - **`log_indented!`** prints nested detail (`┃   message`).
//! - **`log_pipe!`** inserts a spacer before a semantic-level message.
//! - **`log_version!`** / **`log_end!`** frame a whole run.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`**
//!   carry a `[LEVEL]` prefix.
//!
//! Logging can be switched off at runtime for machine-readable output and
//! tests. When the process runs on a simulated clock, each line is prefixed
//! with the simulated `[HH:MM:SS]`.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all subsequent output to `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix shown while running on a simulated clock, empty otherwise.
    pub fn get_timestamp_prefix() -> String {
        if crate::time::source::is_initialized() && crate::time::source::is_simulated() {
            let now = crate::time::source::utc_now();
            format!("[{}] ", crate::time::calendar::clock_label(now))
        } else {
            String::new()
        }
    }

    /// Format one line with `decoration` in front of `message` and write it out.
    ///
    /// `lead` is emitted (with the timestamp prefix) on its own line first,
    /// which is how block starts get their spacer pipe.
    pub fn emit(lead: Option<&str>, decoration: &str, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        let prefix = Self::get_timestamp_prefix();
        let formatted = match lead {
            Some(lead) => format!("{prefix}{lead}\n{prefix}{decoration}{message}\n"),
            None => format!("{prefix}{decoration}{message}\n"),
        };
        write_output(&formatted);
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

// Public so the exported macros can reach it.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($lead:expr, $decoration:expr, $fmt:literal $($arg:tt)*) => {{
        if $crate::logger::Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::Log::emit($lead, $decoration, &message);
        }
    }};
    ($lead:expr, $decoration:expr, $expr:expr) => {{
        if $crate::logger::Log::is_enabled() {
            let message = $expr.to_string();
            $crate::logger::Log::emit($lead, $decoration, &message);
        }
    }};
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣ ", $($arg)*) };
}

/// Log a nested detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┃   ", $($arg)*) };
}

/// Log a bare pipe for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => { $crate::__log_line!(None, "┃", "") };
}

/// Start a new block of related output.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => { $crate::__log_line!(Some("┃"), "┣ ", $($arg)*) };
}

/// Print the application header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(None, "┏ ", "plugtimer v{} ━━╸", env!("CARGO_PKG_VERSION"))
    };
}

/// Print the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => { $crate::__log_line!(None, "╹", "") };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣[\x1b[33mWARNING\x1b[0m] ", $($arg)*) };
}

/// Warning without the pipe decoration, for output outside a block.
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)*) => { $crate::__log_line!(None, "[\x1b[33mWARNING\x1b[0m] ", $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣[\x1b[31mERROR\x1b[0m] ", $($arg)*) };
}

/// Error without the pipe decoration, for output outside a block.
#[macro_export]
macro_rules! log_error_standalone {
    ($($arg:tt)*) => { $crate::__log_line!(None, "[\x1b[31mERROR\x1b[0m] ", $($arg)*) };
}

/// Error that terminates the current flow (`┗` corner).
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => { $crate::__log_line!(Some("┃"), "┗[\x1b[31mERROR\x1b[0m] ", $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣[\x1b[32mINFO\x1b[0m] ", $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣[\x1b[32mDEBUG\x1b[0m] ", $($arg)*) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => { $crate::__log_line!(None, "┣[\x1b[31mCRITICAL\x1b[0m] ", $($arg)*) };
}
