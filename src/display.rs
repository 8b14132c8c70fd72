//! Status display: a three-line summary of the next on window.
//!
//! Line one is the host address, lines two and three show the next
//! energised event's start and end (or the date and "No events"). The
//! display powers down after a configurable idle period and wakes whenever
//! the schedule is regenerated.

use std::net::UdpSocket;

use crate::constants::SECONDS_PER_MINUTE;
use crate::schedule::EventQueue;
use crate::time::{LocalTime, Timestamp};

/// Output device for status lines.
pub trait StatusDisplay {
    fn update(&mut self, ip: &str, line1: &str, line2: &str);

    /// Power down once the idle timeout has elapsed since the last wake.
    fn check_timeout(&mut self, now: Timestamp);

    fn wake(&mut self, now: Timestamp);
}

/// Status lines for the first pending energised event.
pub fn project_status(queue: &EventQueue, time: &LocalTime, now: Timestamp) -> (String, String) {
    match queue.iter().find(|event| event.state) {
        Some(event) => (
            format!("ON  {}", time.format(event.start)),
            format!("Off {}", time.format(event.end)),
        ),
        None => (time.day_month_label(now), "No events".to_string()),
    }
}

/// Address of the interface used for outbound traffic.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub fn local_address() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("192.0.2.1:9")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "offline".to_string())
}

/// Display that writes status changes to the log.
pub struct TerminalDisplay {
    timeout_secs: i64,
    woke_at: Timestamp,
    is_on: bool,
    lines: Option<[String; 3]>,
}

impl TerminalDisplay {
    /// `timeout_minutes` of zero keeps the display on forever.
    pub fn new(timeout_minutes: u32) -> Self {
        Self {
            timeout_secs: i64::from(timeout_minutes) * SECONDS_PER_MINUTE,
            woke_at: 0,
            is_on: true,
            lines: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    fn show(&self) {
        if let Some([ip, line1, line2]) = &self.lines {
            log_block_start!("Status ({})", ip);
            log_indented!("{}", line1);
            log_indented!("{}", line2);
        }
    }
}

impl StatusDisplay for TerminalDisplay {
    fn update(&mut self, ip: &str, line1: &str, line2: &str) {
        let lines = [ip.to_string(), line1.to_string(), line2.to_string()];
        if self.lines.as_ref() == Some(&lines) {
            return;
        }
        self.lines = Some(lines);
        if self.is_on {
            self.show();
        }
    }

    fn check_timeout(&mut self, now: Timestamp) {
        if self.timeout_secs > 0 && self.is_on && now >= self.woke_at + self.timeout_secs {
            self.is_on = false;
            log_decorated!("Display sleeping");
        }
    }

    fn wake(&mut self, now: Timestamp) {
        self.woke_at = now;
        if !self.is_on {
            self.is_on = true;
            self.show();
        }
    }
}
