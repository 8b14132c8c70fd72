//! Outlet controller that only logs, for simulations and previews.

use std::cell::RefCell;

use super::{OutletControl, OutletError, lookup};
use crate::config::OutletConfig;
use crate::schedule::OutletId;

pub struct DryRunOutlets {
    outlets: Vec<OutletConfig>,
    history: RefCell<Vec<(OutletId, bool)>>,
}

impl DryRunOutlets {
    pub fn new(outlets: Vec<OutletConfig>) -> Self {
        Self {
            outlets,
            history: RefCell::new(Vec::new()),
        }
    }

    /// Every switch requested so far, in order.
    pub fn history(&self) -> Vec<(OutletId, bool)> {
        self.history.borrow().clone()
    }
}

impl OutletControl for DryRunOutlets {
    fn set_state(&self, outlet: OutletId, state: bool) -> Result<(), OutletError> {
        let config = lookup(&self.outlets, outlet)?;
        log_indented!(
            "[dry run] {} ({}) -> {}",
            config.name,
            config.address,
            if state { "on" } else { "off" }
        );
        self.history.borrow_mut().push((outlet, state));
        Ok(())
    }

    fn name(&self, outlet: OutletId) -> Option<String> {
        self.outlets.get(outlet).map(|o| o.name.clone())
    }

    fn transport_name(&self) -> &'static str {
        "dry-run"
    }
}
