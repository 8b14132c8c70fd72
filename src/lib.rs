//! # Plugtimer Library
//!
//! Internal library for the plugtimer binary: a smart-plug timer that
//! switches outlets on and off in randomized duty cycles anchored to a fixed
//! start time or the local sunset.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Plugtimer` builder with resource management
//! - **Core Logic**: internal `core` module with the control loop
//! - **Scheduling**: `schedule` module (generator, event queue, random source)
//! - **Time**: `time` module (calendar and DST rules, clock sources, SNTP) and
//!   `geo` for the solar calculator
//! - **Outlets**: `outlet` module with Kasa, Tasmota and dry-run transports
//! - **Configuration**: `config` module for TOML settings with hot-reload
//! - **Commands**: `commands` module for CLI subcommands
//! - **Infrastructure**: signal handling, lock file, status display and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod display;
pub mod geo;
pub mod io;
pub mod outlet;
pub mod schedule;
pub mod time;

mod core;
mod plugtimer;

pub use plugtimer::Plugtimer;
