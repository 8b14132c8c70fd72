//! Command-line command handlers for plugtimer.
//!
//! Each one-shot command lives in its own submodule with a `handle_*`
//! entry point and a `display_help` used by `plugtimer help <command>`.

pub mod help;
pub mod schedule;
pub mod set;
pub mod simulate;
pub mod sunset;
