use serde::Serialize;

use crate::time::{LocalTime, Timestamp};

/// Index into the configured outlet list.
pub type OutletId = usize;

/// One scheduled on/off transition for one outlet.
///
/// Dispatch fires on `start`; `end` only marks when the next transition for
/// the same outlet is due and is used for display and expiry pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub start: Timestamp,
    pub end: Timestamp,
    pub outlet: OutletId,
    /// `true` energises the outlet.
    pub state: bool,
    pub label: Option<String>,
}

impl Event {
    pub fn new(
        start: Timestamp,
        end: Timestamp,
        outlet: OutletId,
        state: bool,
        label: Option<String>,
    ) -> Self {
        debug_assert!(start < end, "event must end after it starts");
        Self {
            start,
            end,
            outlet,
            state,
            label,
        }
    }

    pub fn state_label(&self) -> &'static str {
        if self.state { "on" } else { "off" }
    }

    /// `lamp on Fri 19:05.07, end Fri 19:40.12`
    pub fn describe(&self, time: &LocalTime) -> String {
        let name = match &self.label {
            Some(label) => label.clone(),
            None => format!("outlet {}", self.outlet),
        };
        format!(
            "{} {} {}, end {}",
            name,
            self.state_label(),
            time.format(self.start),
            time.format(self.end)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimulatedClock;
    use std::sync::Arc;

    #[test]
    fn test_describe_uses_label_or_index() {
        let time = LocalTime::new(Arc::new(SimulatedClock::starting_at(0)), 0, "none");
        // 2022-08-26 (Friday) 19:05:07 and 19:40:12
        let start = 1_661_540_707;
        let named = Event::new(start, start + 2105, 0, true, Some("lamp".into()));
        assert_eq!(named.describe(&time), "lamp on Fri 19:05.07, end Fri 19:40.12");

        let anonymous = Event::new(start, start + 60, 3, false, None);
        assert!(anonymous.describe(&time).starts_with("outlet 3 off Fri 19:05.07"));
    }
}
