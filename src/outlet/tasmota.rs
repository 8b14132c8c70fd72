//! Tasmota transport over the firmware's HTTP command interface.

use reqwest::blocking::Client;
use std::time::Duration;

use super::{OutletControl, OutletError, lookup};
use crate::config::OutletConfig;
use crate::constants::TASMOTA_TIMEOUT_MS;
use crate::schedule::OutletId;

/// `http://<address>/cm?cmnd=Power%20<0|1>`
pub fn power_url(address: &str, state: bool) -> String {
    format!("http://{address}/cm?cmnd=Power%20{}", u8::from(state))
}

pub struct TasmotaOutlets {
    outlets: Vec<OutletConfig>,
}

impl TasmotaOutlets {
    pub fn new(outlets: Vec<OutletConfig>) -> Self {
        Self { outlets }
    }
}

impl OutletControl for TasmotaOutlets {
    fn set_state(&self, outlet: OutletId, state: bool) -> Result<(), OutletError> {
        let config = lookup(&self.outlets, outlet)?;
        let http_err = |source| OutletError::Http {
            address: config.address.clone(),
            source,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(TASMOTA_TIMEOUT_MS))
            .build()
            .map_err(http_err)?;
        let response = client
            .get(power_url(&config.address, state))
            .send()
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OutletError::Rejected {
                address: config.address.clone(),
                detail: format!("HTTP {status}"),
            });
        }
        Ok(())
    }

    fn name(&self, outlet: OutletId) -> Option<String> {
        self.outlets.get(outlet).map(|o| o.name.clone())
    }

    fn transport_name(&self) -> &'static str {
        "tasmota"
    }
}
