//! Time handling for plugtimer.
//!
//! - [`calendar`]: formatting and daylight-saving rules on plain timestamps
//! - [`source`]: the [`ClockSource`] abstraction with system and simulated clocks
//! - [`ntp`]: the SNTP query used by the system clock
//! - [`local`]: [`LocalTime`], the zone-aware view the scheduler works with

pub mod calendar;
pub mod local;
pub mod ntp;
pub mod source;

pub use calendar::{DstRegion, TimeError, Timestamp, day_month_label, dst_window, format_timestamp, is_dst};
pub use local::LocalTime;
pub use source::{ClockSource, SimulatedClock, SystemClock};
