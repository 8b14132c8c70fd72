//! Clock source abstraction for real and simulated time.
//!
//! Everything time-dependent in plugtimer reads the clock through
//! [`ClockSource`], so the control loop can run against the system clock
//! (optionally disciplined by an SNTP server) or against a
//! [`SimulatedClock`] that fast-forwards through sleeps for previews and tests.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration as StdDuration, Instant};

use super::calendar::Timestamp;
use crate::constants::*;

/// Global clock used by the logger to prefix simulated timestamps.
static CLOCK_SOURCE: OnceCell<Arc<dyn ClockSource>> = OnceCell::new();

/// Trait for abstracting time operations.
pub trait ClockSource: Send + Sync {
    /// Current UTC time in whole seconds.
    fn utc_now(&self) -> Timestamp;

    /// Millisecond tick counter with an arbitrary epoch.
    ///
    /// The counter wraps at `u32::MAX`; compare values only through
    /// [`ticks_diff`], never directly.
    fn ticks_ms(&self) -> u32;

    /// Sleep for the specified duration (or simulate it).
    fn sleep(&self, duration: StdDuration);

    /// Authoritative UTC time from an external source, if one is reachable.
    fn network_time(&self) -> Option<Timestamp>;

    fn is_simulated(&self) -> bool {
        false
    }

    /// Whether a simulation has reached its end time (always false for real time).
    fn is_ended(&self) -> bool {
        false
    }
}

/// Signed difference `later - earlier` between two wrapping tick values.
pub fn ticks_diff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// System wall clock, synchronised against an SNTP server.
pub struct SystemClock {
    /// `host[:port]` of the time server; empty means trust the system clock.
    ntp_server: String,
    started: Instant,
}

impl SystemClock {
    pub fn new(ntp_server: impl Into<String>) -> Self {
        Self {
            ntp_server: ntp_server.into(),
            started: Instant::now(),
        }
    }
}

impl ClockSource for SystemClock {
    fn utc_now(&self) -> Timestamp {
        Utc::now().timestamp()
    }

    fn ticks_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn network_time(&self) -> Option<Timestamp> {
        if self.ntp_server.is_empty() {
            return Some(self.utc_now());
        }

        for attempt in 1..=NTP_ATTEMPTS {
            match super::ntp::query(&self.ntp_server) {
                Ok(ts) => return Some(ts),
                Err(e) => {
                    log_warning!(
                        "Time server {} unreachable (attempt {}/{}): {}",
                        self.ntp_server,
                        attempt,
                        NTP_ATTEMPTS,
                        e
                    );
                    if attempt < NTP_ATTEMPTS {
                        std::thread::sleep(StdDuration::from_millis(NTP_RETRY_DELAY_MS));
                    }
                }
            }
        }
        None
    }
}

/// Simulated clock bounded by a start and end time.
///
/// With a multiplier of `0.0` sleeps return immediately and advance the
/// clock by exactly the requested duration (fast-forward). Any positive
/// multiplier sleeps for `duration / multiplier` of real time before
/// advancing, so e.g. `60.0` plays one simulated minute per real second.
pub struct SimulatedClock {
    end: Timestamp,
    multiplier: f64,
    /// Simulated time in milliseconds since the Unix epoch.
    current_ms: Mutex<i64>,
}

impl SimulatedClock {
    pub fn new(start: Timestamp, end: Timestamp, multiplier: f64) -> Self {
        Self {
            end,
            multiplier: if multiplier > 0.0 { multiplier } else { 0.0 },
            current_ms: Mutex::new(start * 1000),
        }
    }

    /// Clock that starts at `start` and never ends, for tests.
    pub fn starting_at(start: Timestamp) -> Self {
        Self::new(start, Timestamp::MAX / 1000, 0.0)
    }

    fn current(&self) -> MutexGuard<'_, i64> {
        self.current_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move the clock forward by `duration`, stopping at the end time.
    pub fn advance(&self, duration: StdDuration) {
        let mut current = self.current();
        let step = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        *current = current.saturating_add(step).min(self.end.saturating_mul(1000));
    }

    /// Jump directly to `ts`.
    pub fn set(&self, ts: Timestamp) {
        *self.current() = ts * 1000;
    }
}

impl ClockSource for SimulatedClock {
    fn utc_now(&self) -> Timestamp {
        self.current().div_euclid(1000)
    }

    fn ticks_ms(&self) -> u32 {
        *self.current() as u32
    }

    fn sleep(&self, duration: StdDuration) {
        if self.multiplier > 0.0 {
            std::thread::sleep(duration.div_f64(self.multiplier));
        }
        self.advance(duration);
    }

    fn network_time(&self) -> Option<Timestamp> {
        Some(self.utc_now())
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.utc_now() >= self.end
    }
}

/// Register the process-wide clock (call once at startup).
pub fn init_clock_source(source: Arc<dyn ClockSource>) {
    CLOCK_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    CLOCK_SOURCE.get().is_some()
}

/// The registered clock, defaulting to the system clock without SNTP.
pub fn clock() -> Arc<dyn ClockSource> {
    CLOCK_SOURCE
        .get_or_init(|| Arc::new(SystemClock::new("")))
        .clone()
}

pub fn utc_now() -> Timestamp {
    clock().utc_now()
}

pub fn is_simulated() -> bool {
    clock().is_simulated()
}

/// Parse `"YYYY-MM-DD HH:MM:SS"` as a UTC timestamp.
pub fn parse_datetime(s: &str) -> Result<Timestamp, String> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
}

/// Render a UTC timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_datetime(ts: Timestamp) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
