//! Application coordinator that manages the lifecycle of plugtimer.
//!
//! Loads the configuration, takes the single-instance lock, installs signal
//! handlers and the config watcher, then hands everything to the control
//! loop.
//!
//! - Normal startup: `Plugtimer::new(debug_enabled).run()`
//! - Simulation: `Plugtimer::new(debug_enabled).without_lock().dry_run().with_clock(clock).run()`

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    config::{self, Config},
    core::{Core, CoreParams},
    display::TerminalDisplay,
    io::lock::acquire_lock,
    io::signals::setup_signal_handler,
    outlet::create_outlet_control,
    time::{ClockSource, LocalTime, SystemClock, source::init_clock_source},
};

/// Builder for configuring and running the timer.
pub struct Plugtimer {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    dry_run: bool,
    clock: Option<Arc<dyn ClockSource>>,
}

impl Plugtimer {
    /// Create a new runner with defaults matching a normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            dry_run: false,
            clock: None,
        }
    }

    /// Skip lock file creation
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Log outlet switches instead of sending them
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Use `clock` instead of the SNTP-disciplined system clock
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Run until a shutdown signal (or the end of a simulation).
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let config = Config::load().context("Configuration failed")?;

        let _lock = if self.create_lock {
            match acquire_lock()? {
                Some(lock) => Some(lock),
                None => {
                    log_end!();
                    return Ok(());
                }
            }
        } else {
            None
        };

        config.log_config();

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new(config.ntp_server.clone())));
        init_clock_source(clock.clone());
        let time = LocalTime::from_config(clock, &config);

        let signal_state = setup_signal_handler(self.debug_enabled)?;
        if let Err(e) =
            config::start_config_watcher(signal_state.signal_sender.clone(), self.debug_enabled)
        {
            log_pipe!();
            log_warning!("Hot reload unavailable: {e:#}");
        }

        let outlets = create_outlet_control(&config, self.dry_run);
        let display = Box::new(TerminalDisplay::new(config.display_timeout_minutes));

        Core::new(CoreParams {
            config,
            time,
            outlets,
            display,
            signal_state,
            rng: None,
            debug_enabled: self.debug_enabled,
            dry_run: self.dry_run,
        })
        .execute()?;

        log_end!();
        Ok(())
    }
}
