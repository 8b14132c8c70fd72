//! Outlet control: switching smart plugs on and off.
//!
//! The scheduler only sees the [`OutletControl`] trait. Which transport sits
//! behind it (Kasa, Tasmota, or a dry run that only logs) is chosen once at
//! startup from the configuration.

pub mod dry_run;
pub mod kasa;
pub mod tasmota;

use crate::config::{Config, OutletConfig, Transport};
use crate::schedule::OutletId;

pub use dry_run::DryRunOutlets;
pub use kasa::KasaOutlets;
pub use tasmota::TasmotaOutlets;

#[derive(Debug, thiserror::Error)]
pub enum OutletError {
    #[error("could not connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed reply from {address}: {detail}")]
    Protocol { address: String, detail: String },

    #[error("{address} rejected the command: {detail}")]
    Rejected { address: String, detail: String },

    #[error("no outlet with id {0}")]
    UnknownOutlet(OutletId),

    #[error("HTTP request to {address} failed: {source}")]
    Http {
        address: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Switches configured outlets.
#[cfg_attr(test, mockall::automock)]
pub trait OutletControl {
    /// Drive `outlet` to `state` (`true` energises it).
    fn set_state(&self, outlet: OutletId, state: bool) -> Result<(), OutletError>;

    /// Display name of `outlet`, if it exists.
    fn name(&self, outlet: OutletId) -> Option<String>;

    fn transport_name(&self) -> &'static str;
}

/// Look up an outlet by id in a configured list.
fn lookup(outlets: &[OutletConfig], outlet: OutletId) -> Result<&OutletConfig, OutletError> {
    outlets.get(outlet).ok_or(OutletError::UnknownOutlet(outlet))
}

/// Build the outlet controller for `config`.
///
/// `dry_run` swaps the real transport for one that only logs.
pub fn create_outlet_control(config: &Config, dry_run: bool) -> Box<dyn OutletControl> {
    let outlets = config.outlets.clone();
    if dry_run {
        return Box::new(DryRunOutlets::new(outlets));
    }
    match config.transport {
        Transport::Kasa => Box::new(KasaOutlets::new(outlets)),
        Transport::Tasmota => Box::new(TasmotaOutlets::new(outlets)),
    }
}
