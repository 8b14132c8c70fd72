//! Schedule generation and the pending event queue.
//!
//! [`Scheduler`] owns the active configuration, the ordered queue of pending
//! events and the random source used for jitter. The queue is only ever
//! replaced wholesale (on regeneration) or popped from the head (on
//! dispatch).

pub mod event;
pub mod generator;
pub mod queue;
pub mod random;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{Config, ConfigError};
use crate::outlet::OutletControl;
use crate::time::{LocalTime, Timestamp};

pub use event::{Event, OutletId};
pub use generator::{OutletPlan, generate, prune_expired, resolve_anchor, sort_events};
pub use queue::{EventQueue, Wait};
pub use random::{RandomSource, jitter_secs};

#[cfg(any(test, feature = "testing-support"))]
pub use random::ScriptedRandom;

pub struct Scheduler {
    config: Config,
    queue: EventQueue,
    rng: Box<dyn RandomSource>,
}

impl Scheduler {
    /// Scheduler seeded from system entropy.
    pub fn new(config: Config) -> Self {
        Self::with_random(config, Box::new(StdRng::from_entropy()))
    }

    pub fn with_random(config: Config, rng: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            queue: EventQueue::new(),
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Plans for every configured outlet, labelled by the outlet controller.
    fn outlet_plans(&self, outlets: &dyn OutletControl) -> Vec<OutletPlan> {
        self.config
            .outlets
            .iter()
            .enumerate()
            .map(|(id, outlet)| OutletPlan {
                id,
                label: outlets.name(id),
                inverted: outlet.inverted,
            })
            .collect()
    }

    /// Replace the queue with a freshly generated schedule.
    ///
    /// Returns the number of pending events.
    pub fn regenerate(&mut self, time: &LocalTime, outlets: &dyn OutletControl) -> usize {
        let plans = self.outlet_plans(outlets);
        let now = time.now();
        let events = generate(&self.config, &plans, time, now, self.rng.as_mut());
        self.queue.replace(events);

        log_block_start!("Generated {} event(s)", self.queue.len());
        for event in self.queue.iter() {
            log_indented!("{}", event.describe(time));
        }
        self.queue.len()
    }

    /// Pop the head event if it has started by `now`.
    pub fn next_due(&mut self, now: Timestamp) -> Option<Event> {
        self.queue.next_due(now)
    }

    pub fn ms_until_next(&self, now: Timestamp) -> Wait {
        self.queue.ms_until_next(now)
    }

    /// Swap in `config`, regenerating only when it differs from the current one.
    ///
    /// Returns whether anything changed.
    pub fn replace_config(
        &mut self,
        config: Config,
        time: &LocalTime,
        outlets: &dyn OutletControl,
    ) -> bool {
        if config == self.config {
            return false;
        }
        self.config = config;
        self.regenerate(time, outlets);
        true
    }

    /// Apply `field=value` updates from a configuration client.
    ///
    /// Nothing changes on error. On success the schedule is regenerated if
    /// at least one value differs, and the result says whether it was.
    pub fn apply_update<K, V>(
        &mut self,
        updates: &[(K, V)],
        time: &LocalTime,
        outlets: &dyn OutletControl,
    ) -> Result<bool, ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let updated = self.config.with_updates(updates)?;
        Ok(self.replace_config(updated, time, outlets))
    }
}
