//! Core control loop.
//!
//! The `Core` alternates between dispatching matured events to the outlets
//! and sleeping until the next one is due. It:
//!
//! - Resynchronises the clock hourly
//! - Regenerates the whole schedule whenever the queue runs dry
//! - Dispatches events strictly in start order, one at a time
//! - Keeps the status display current
//! - Applies configuration reloads from signals or the file watcher
//!
//! Sleeps are capped at one second so shutdown and reload requests are
//! never delayed for long.

use anyhow::Result;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::{
    config::{self, Config},
    constants::MAX_LOOP_SLEEP_MS,
    display::{StatusDisplay, local_address, project_status},
    io::signals::{SignalMessage, SignalState},
    outlet::{OutletControl, create_outlet_control},
    schedule::{Event, RandomSource, Scheduler, Wait},
    time::LocalTime,
};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub config: Config,
    pub time: LocalTime,
    pub outlets: Box<dyn OutletControl>,
    pub display: Box<dyn StatusDisplay>,
    pub signal_state: SignalState,
    /// Injected random source; `None` seeds from entropy.
    pub rng: Option<Box<dyn RandomSource>>,
    pub debug_enabled: bool,
    /// Outlets are dry-run stand-ins; keep them across reloads.
    pub dry_run: bool,
}

pub(crate) struct Core {
    scheduler: Scheduler,
    time: LocalTime,
    outlets: Box<dyn OutletControl>,
    display: Box<dyn StatusDisplay>,
    signal_state: SignalState,
    debug_enabled: bool,
    dry_run: bool,
    address: String,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let scheduler = match params.rng {
            Some(rng) => Scheduler::with_random(params.config, rng),
            None => Scheduler::new(params.config),
        };
        Self {
            scheduler,
            time: params.time,
            outlets: params.outlets,
            display: params.display,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            dry_run: params.dry_run,
            address: local_address(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run until shutdown or until a simulated clock reaches its end.
    pub fn execute(mut self) -> Result<()> {
        log_block_start!(
            "Controlling {} outlet(s) via {}",
            self.scheduler.config().outlets.len(),
            self.outlets.transport_name()
        );

        if !self.time.set_clock(None) {
            log_warning!("Clock not synchronised, continuing on local time");
        }

        while self.signal_state.is_running() && !self.time.clock().is_ended() {
            let sleep = self.step();
            if let Some(message) = self.wait_for_message(sleep) {
                self.handle_message(message);
            }
        }

        log_block_start!("Stopping at {}", self.time.format(self.time.now()));
        Ok(())
    }

    /// One pass of the loop, returning how long to sleep afterwards.
    pub fn step(&mut self) -> Duration {
        if self.time.check_sync(None) && self.debug_enabled {
            log_debug!("Clock resynchronised");
        }

        if self.scheduler.queue().is_empty() {
            self.regenerate();
        }

        let now = self.time.now();
        self.display.check_timeout(now);
        while let Some(event) = self.scheduler.next_due(now) {
            self.dispatch(&event);
        }
        self.refresh_display();

        match self.scheduler.ms_until_next(now) {
            Wait::Until(wait) => wait.min(Duration::from_millis(MAX_LOOP_SLEEP_MS)),
            Wait::Empty(poll) => {
                log_decorated!("No events scheduled");
                poll.min(Duration::from_millis(MAX_LOOP_SLEEP_MS))
            }
        }
    }

    fn regenerate(&mut self) {
        self.scheduler.regenerate(&self.time, self.outlets.as_ref());
        self.display.wake(self.time.now());
    }

    /// Switch the outlet for `event`. Failures are logged; the event is spent either way.
    fn dispatch(&mut self, event: &Event) {
        log_block_start!("Event ready: {}", event.describe(&self.time));
        if let Err(e) = self.outlets.set_state(event.outlet, event.state) {
            log_error!("Failed to switch outlet: {e}");
        }

        match self.scheduler.queue().head() {
            Some(next) => log_indented!("Next event at {}", self.time.format(next.start)),
            None => log_indented!("Processed last event"),
        }
    }

    fn refresh_display(&mut self) {
        let (line1, line2) = project_status(self.scheduler.queue(), &self.time, self.time.now());
        self.display.update(&self.address, &line1, &line2);
    }

    /// Sleep up to `duration`, returning early if a message arrives.
    ///
    /// A simulated clock sleeps in full and then polls once.
    fn wait_for_message(&self, duration: Duration) -> Option<SignalMessage> {
        let receiver = &self.signal_state.signal_receiver;
        if self.time.clock().is_simulated() {
            self.time.clock().sleep(duration);
            return receiver.try_recv().ok();
        }
        match receiver.recv_timeout(duration) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // The loop keeps a sender alive, so this only follows a shutdown
                None
            }
        }
    }

    fn handle_message(&mut self, message: SignalMessage) {
        match message {
            SignalMessage::Shutdown => {
                self.signal_state
                    .running
                    .store(false, std::sync::atomic::Ordering::SeqCst);
            }
            SignalMessage::Reload => match config::load() {
                Ok(new_config) => {
                    self.apply_config(new_config);
                }
                Err(e) => {
                    log_pipe!();
                    log_error!("Failed to reload config: {e:#}");
                    log_indented!("Continuing with previous configuration");
                }
            },
        }
    }

    /// Install a new configuration, regenerating only if it changed.
    ///
    /// Zone and outlet changes rebuild the local time and outlet controller first.
    pub fn apply_config(&mut self, new_config: Config) -> bool {
        let old = self.scheduler.config();
        if old == &new_config {
            if self.debug_enabled {
                log_debug!("Configuration unchanged");
            }
            return false;
        }

        if old.utc_offset_hours != new_config.utc_offset_hours
            || old.dst_region != new_config.dst_region
        {
            self.time = LocalTime::from_config(self.time.clock().clone(), &new_config);
        }
        if !self.dry_run
            && (old.transport != new_config.transport || old.outlets != new_config.outlets)
        {
            self.outlets = create_outlet_control(&new_config, false);
        }

        log_block_start!("Configuration changed, rescheduling");
        new_config.log_config();
        self.scheduler
            .replace_config(new_config, &self.time, self.outlets.as_ref());
        self.display.wake(self.time.now());
        self.refresh_display();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::display::TerminalDisplay;
    use crate::outlet::{MockOutletControl, OutletError};
    use crate::schedule::ScriptedRandom;
    use crate::time::{SimulatedClock, Timestamp, calendar};
    use chrono::NaiveDate;
    use mockall::Sequence;
    use std::sync::Arc;

    fn config() -> Config {
        Config {
            use_sunset: false,
            start_hour: 19,
            start_minute: 0,
            duration_minutes: TEST_STANDARD_DURATION,
            on_percent: TEST_STANDARD_ON_PERCENT,
            max_jitter_minutes: 0,
            min_sequences: 2,
            max_sequences: 2,
            dst_region: "none".into(),
            ntp_server: String::new(),
            ..Config::default()
        }
    }

    fn at(hour: u32, minute: u32) -> Timestamp {
        calendar::timestamp_of(NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(), hour, minute)
    }

    fn core_with(outlets: MockOutletControl, start: Timestamp, end: Timestamp) -> Core {
        crate::logger::Log::set_enabled(false);
        let config = config();
        let clock = Arc::new(SimulatedClock::new(start, end, 0.0));
        Core::new(CoreParams {
            time: LocalTime::from_config(clock, &config),
            config,
            outlets: Box::new(outlets),
            display: Box::new(TerminalDisplay::new(1)),
            signal_state: SignalState::new(),
            rng: Some(Box::new(ScriptedRandom::default())),
            debug_enabled: false,
            dry_run: false,
        })
    }

    fn named_mock() -> MockOutletControl {
        let mut mock = MockOutletControl::new();
        mock.expect_name().returning(|_| Some("lamp".to_string()));
        mock.expect_transport_name().return_const("mock");
        mock
    }

    #[test]
    fn test_execute_dispatches_window_in_order() {
        let mut mock = named_mock();
        let mut seq = Sequence::new();
        for state in [true, false, true, false] {
            mock.expect_set_state()
                .withf(move |&outlet, &s| outlet == 0 && s == state)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let core = core_with(mock, at(18, 0), at(21, 0));
        core.execute().unwrap();
    }

    #[test]
    fn test_first_step_generates_and_sleeps_at_most_one_second() {
        let core = &mut core_with(named_mock(), at(12, 0), at(23, 0));
        let sleep = core.step();
        assert_eq!(sleep, Duration::from_millis(MAX_LOOP_SLEEP_MS));
        assert_eq!(core.scheduler().queue().len(), 4);
    }

    #[test]
    fn test_failed_dispatch_still_consumes_event() {
        let mut mock = named_mock();
        mock.expect_set_state().times(1).returning(|_, _| {
            Err(OutletError::Protocol {
                address: "plug".into(),
                detail: "unreachable".into(),
            })
        });

        // One second past the first event's start
        let core = &mut core_with(mock, at(19, 0) + 2, at(23, 0));
        core.step();
        assert_eq!(core.scheduler().queue().len(), 3);
        assert!(core.scheduler().queue().head().is_some_and(|e| !e.state));
    }

    #[test]
    fn test_shutdown_message_stops_loop() {
        let mut mock = named_mock();
        mock.expect_set_state().never();
        let core = core_with(mock, at(12, 0), at(23, 0));
        core.signal_state
            .signal_sender
            .send(SignalMessage::Shutdown)
            .unwrap();
        core.execute().unwrap();
    }

    #[test]
    fn test_apply_config_regenerates_only_on_change() {
        let core = &mut core_with(named_mock(), at(12, 0), at(23, 0));
        core.step();
        assert!(!core.apply_config(config()));

        let later = Config {
            start_hour: 20,
            ..config()
        };
        assert!(core.apply_config(later));
        assert_eq!(
            core.scheduler().queue().head().map(|e| e.start),
            Some(at(20, 0) + 1)
        );
    }
}
