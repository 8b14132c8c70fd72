//! Minimal SNTP (RFC 4330) client used to seed the clock.

use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use super::calendar::Timestamp;
use crate::constants::*;

/// Mode 3 (client), version 3, no leap indicator.
const CLIENT_REQUEST_HEADER: u8 = 0x1B;
/// Offset of the 32-bit transmit timestamp seconds field.
const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;

/// `server` as a resolvable `host:port`, adding the NTP port when none is given.
///
/// Accepts host names, IPv4 and bare IPv6 literals, with or without a port
/// (`[::1]:123` for IPv6 with a port).
fn server_address(server: &str) -> String {
    if let Ok(socket) = server.parse::<SocketAddr>() {
        return socket.to_string();
    }
    if let Ok(ip) = server.trim_matches(['[', ']']).parse::<IpAddr>() {
        return SocketAddr::new(ip, NTP_PORT).to_string();
    }
    match server.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            server.to_string()
        }
        _ => format!("{server}:{NTP_PORT}"),
    }
}

/// Ask `server` (`host`, `host:port` or an IP literal) for the current UTC time.
pub fn query(server: &str) -> Result<Timestamp> {
    let address = server_address(server);
    let target = address
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve time server {address}"))?
        .next()
        .with_context(|| format!("No address found for time server {address}"))?;

    let local: IpAddr = if target.is_ipv6() {
        Ipv6Addr::UNSPECIFIED.into()
    } else {
        Ipv4Addr::UNSPECIFIED.into()
    };
    let socket = UdpSocket::bind((local, 0)).context("Failed to bind UDP socket")?;
    socket
        .set_read_timeout(Some(Duration::from_millis(NTP_TIMEOUT_MS)))
        .context("Failed to set NTP read timeout")?;

    socket
        .send_to(&request_packet(), target)
        .context("Failed to send NTP request")?;

    let mut reply = [0u8; NTP_PACKET_SIZE];
    let (len, _) = socket
        .recv_from(&mut reply)
        .context("No reply from time server")?;

    parse_reply(&reply[..len])
}

fn request_packet() -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = CLIENT_REQUEST_HEADER;
    packet
}

/// Extract the transmit timestamp and convert it to Unix seconds.
fn parse_reply(reply: &[u8]) -> Result<Timestamp> {
    if reply.len() < NTP_PACKET_SIZE {
        anyhow::bail!("Short NTP reply ({} bytes)", reply.len());
    }
    let field: [u8; 4] = reply[TRANSMIT_TIMESTAMP_OFFSET..TRANSMIT_TIMESTAMP_OFFSET + 4]
        .try_into()
        .context("Malformed NTP transmit timestamp")?;
    let ntp_seconds = i64::from(u32::from_be_bytes(field));
    if ntp_seconds == 0 {
        anyhow::bail!("Time server sent an unsynchronised reply");
    }
    Ok(ntp_seconds - NTP_UNIX_EPOCH_DELTA)
}
