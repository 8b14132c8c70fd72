use std::time::Duration;

use super::event::Event;
use super::generator::{prune_expired, sort_events};
use crate::constants::EMPTY_QUEUE_POLL_MS;
use crate::time::Timestamp;

/// How long the loop may wait before the next event matures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Time until the head event starts (zero if already due).
    Until(Duration),
    /// Nothing is scheduled; poll again after the fallback interval.
    Empty(Duration),
}

impl Wait {
    pub fn duration(self) -> Duration {
        match self {
            Wait::Until(d) | Wait::Empty(d) => d,
        }
    }
}

/// Pending events ordered by non-decreasing start.
///
/// The queue changes in only two ways: [`replace`](Self::replace) swaps in a
/// freshly generated set and [`next_due`](Self::next_due) pops a matured head.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every pending event, restoring start order.
    pub fn replace(&mut self, mut events: Vec<Event>) {
        sort_events(&mut events);
        self.events = events;
    }

    /// Drop leading events that ended before `now`.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        prune_expired(&mut self.events, now)
    }

    /// Pop the head if it has started by `now`.
    pub fn next_due(&mut self, now: Timestamp) -> Option<Event> {
        match self.events.first() {
            Some(head) if head.start <= now => Some(self.events.remove(0)),
            _ => None,
        }
    }

    pub fn ms_until_next(&self, now: Timestamp) -> Wait {
        match self.events.first() {
            Some(head) => {
                let secs = (head.start - now).max(0) as u64;
                Wait::Until(Duration::from_secs(secs))
            }
            None => Wait::Empty(Duration::from_millis(EMPTY_QUEUE_POLL_MS)),
        }
    }

    pub fn head(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
