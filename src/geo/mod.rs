//! Geographic sunset calculations.
//!
//! - [`solar`]: the astronomical series (Julian day, declination, equation of
//!   time, hour angle) producing sunset in UTC.
//!
//! Converting that UTC result into the local schedule frame is the job of
//! [`crate::time::LocalTime::sunset_on`].

pub mod solar;

pub use solar::{julian_day, sunset};
