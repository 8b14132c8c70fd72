//! TP-Link Kasa transport.
//!
//! Commands are JSON documents sent over TCP port 9999, prefixed with a
//! 4-byte big-endian length and obscured with an autokey XOR cipher: each
//! byte is XOR-ed with the previous ciphertext byte, starting from 171.

use serde_json::{Value, json};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{OutletControl, OutletError, lookup};
use crate::config::OutletConfig;
use crate::constants::{KASA_BUFFER_SIZE, KASA_CIPHER_KEY, KASA_PORT, KASA_TIMEOUT_MS};
use crate::schedule::OutletId;

/// Encrypt `plain` and prepend its length.
pub fn encrypt(plain: &str) -> Vec<u8> {
    let bytes = plain.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + 4);
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    let mut key = KASA_CIPHER_KEY;
    for &byte in bytes {
        key ^= byte;
        out.push(key);
    }
    out
}

/// Decrypt a framed reply, skipping the length prefix.
pub fn decrypt(framed: &[u8]) -> String {
    let mut key = KASA_CIPHER_KEY;
    let plain: Vec<u8> = framed
        .iter()
        .skip(4)
        .map(|&byte| {
            let decoded = key ^ byte;
            key = byte;
            decoded
        })
        .collect();
    String::from_utf8_lossy(&plain).into_owned()
}

/// `set_relay_state` command, scoped to one socket on multi-outlet strips.
pub fn relay_command(state: bool, child_id: Option<&str>) -> String {
    let relay = json!({ "set_relay_state": { "state": u8::from(state) } });
    let command = match child_id {
        Some(id) => json!({ "context": { "child_ids": [id] }, "system": relay }),
        None => json!({ "system": relay }),
    };
    command.to_string()
}

/// Check the `err_code` in a decoded `set_relay_state` reply.
fn check_reply(address: &str, reply: &str) -> Result<(), OutletError> {
    let value: Value = serde_json::from_str(reply).map_err(|e| OutletError::Protocol {
        address: address.to_string(),
        detail: e.to_string(),
    })?;
    let code = value
        .pointer("/system/set_relay_state/err_code")
        .and_then(Value::as_i64)
        .ok_or_else(|| OutletError::Protocol {
            address: address.to_string(),
            detail: "missing err_code".to_string(),
        })?;
    if code != 0 {
        let detail = value
            .pointer("/system/set_relay_state/err_msg")
            .and_then(Value::as_str)
            .map_or_else(|| format!("err_code {code}"), str::to_string);
        return Err(OutletError::Rejected {
            address: address.to_string(),
            detail,
        });
    }
    Ok(())
}

fn resolve(address: &str, port: u16) -> Result<SocketAddr, OutletError> {
    let io_err = |source| OutletError::Connect {
        address: address.to_string(),
        source,
    };
    (address, port)
        .to_socket_addrs()
        .map_err(io_err)?
        .next()
        .ok_or_else(|| {
            io_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "address did not resolve",
            ))
        })
}

/// Send one framed command to `address:port` and return the decrypted reply.
fn exchange(address: &str, port: u16, command: &str) -> Result<String, OutletError> {
    let timeout = Duration::from_millis(KASA_TIMEOUT_MS);
    let io_err = |source| OutletError::Io {
        address: address.to_string(),
        source,
    };

    let mut stream =
        TcpStream::connect_timeout(&resolve(address, port)?, timeout).map_err(|source| {
            OutletError::Connect {
                address: address.to_string(),
                source,
            }
        })?;
    stream.set_read_timeout(Some(timeout)).map_err(io_err)?;
    stream.set_write_timeout(Some(timeout)).map_err(io_err)?;
    stream.write_all(&encrypt(command)).map_err(io_err)?;

    let mut buffer = vec![0u8; KASA_BUFFER_SIZE];
    let read = stream.read(&mut buffer).map_err(io_err)?;
    if read <= 4 {
        return Err(OutletError::Protocol {
            address: address.to_string(),
            detail: format!("short reply ({read} bytes)"),
        });
    }
    Ok(decrypt(&buffer[..read]))
}

/// Kasa plugs and power strips.
pub struct KasaOutlets {
    outlets: Vec<OutletConfig>,
}

impl KasaOutlets {
    pub fn new(outlets: Vec<OutletConfig>) -> Self {
        Self { outlets }
    }
}

impl OutletControl for KasaOutlets {
    fn set_state(&self, outlet: OutletId, state: bool) -> Result<(), OutletError> {
        let config = lookup(&self.outlets, outlet)?;
        let command = relay_command(state, config.child_id.as_deref());
        let reply = exchange(&config.address, KASA_PORT, &command)?;
        check_reply(&config.address, &reply)
    }

    fn name(&self, outlet: OutletId) -> Option<String> {
        self.outlets.get(outlet).map(|o| o.name.clone())
    }

    fn transport_name(&self) -> &'static str {
        "kasa"
    }
}
