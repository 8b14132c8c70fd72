//! Local civil time on top of a [`ClockSource`].
//!
//! [`LocalTime`] owns the clock and the zone rules (a fixed UTC offset plus an
//! optional daylight-saving region) and turns UTC readings into local-frame
//! timestamps. It also tracks when the clock was last synchronised against
//! the clock's authoritative source so the control loop can resync hourly.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::sync::Arc;

use super::calendar::{self, DstRegion, Timestamp};
use super::source::{ClockSource, ticks_diff};
use crate::constants::*;
use crate::geo;

/// Receives the local calendar time after a successful sync, e.g. to program an RTC.
pub type ClockSetter<'a> = &'a mut dyn FnMut(NaiveDateTime);

pub struct LocalTime {
    clock: Arc<dyn ClockSource>,
    utc_offset_hours: i32,
    dst_region: Option<DstRegion>,
    dst_offset_hours: i32,
    /// Seconds added to the clock reading, learned from the last network sync.
    correction_secs: i64,
    synced_at: Option<u32>,
    /// Tick of the last failed sync attempt.
    failed_at: Option<u32>,
    resync_interval_ms: u32,
}

impl LocalTime {
    /// Build from a clock and zone rules.
    ///
    /// An unknown region tag is reported and treated as "no daylight saving";
    /// it never stops the clock from working.
    pub fn new(clock: Arc<dyn ClockSource>, utc_offset_hours: i32, dst_region: &str) -> Self {
        let dst_region = match calendar::parse_region(dst_region) {
            Ok(region) => region,
            Err(e) => {
                log_pipe!();
                log_warning!("{e}");
                log_indented!("Daylight saving adjustment disabled");
                None
            }
        };

        let mut time = Self {
            clock,
            utc_offset_hours,
            dst_region,
            dst_offset_hours: 0,
            correction_secs: 0,
            synced_at: None,
            failed_at: None,
            resync_interval_ms: CLOCK_RESYNC_INTERVAL_MS,
        };
        let utc = time.utc_now();
        time.update_dst(utc);
        time
    }

    pub fn from_config(clock: Arc<dyn ClockSource>, config: &crate::config::Config) -> Self {
        Self::new(clock, config.utc_offset_hours, &config.dst_region)
    }

    pub fn clock(&self) -> &Arc<dyn ClockSource> {
        &self.clock
    }

    pub fn dst_region(&self) -> Option<DstRegion> {
        self.dst_region
    }

    pub fn is_dst_active(&self) -> bool {
        self.dst_offset_hours != 0
    }

    /// Total offset of the local frame from UTC, in seconds.
    pub fn offset_secs(&self) -> i64 {
        i64::from(self.utc_offset_hours + self.dst_offset_hours) * SECONDS_PER_HOUR
    }

    fn utc_now(&self) -> Timestamp {
        self.clock.utc_now() + self.correction_secs
    }

    /// Current time as a local-frame timestamp.
    pub fn now(&self) -> Timestamp {
        self.utc_now() + self.offset_secs()
    }

    /// Wrapping millisecond tick counter; compare values with [`ticks_diff`] only.
    pub fn ticks_ms(&self) -> u32 {
        self.clock.ticks_ms()
    }

    /// Whether daylight saving is in force at the UTC instant `utc`.
    fn dst_active_at(&self, utc: Timestamp) -> bool {
        match self.dst_region {
            // EU transitions are defined in UTC
            Some(region @ DstRegion::Eu) => region.contains(utc),
            // North American transitions are defined in local standard time
            Some(region @ DstRegion::NorthAmerica) => {
                region.contains(utc + i64::from(self.utc_offset_hours) * SECONDS_PER_HOUR)
            }
            None => false,
        }
    }

    fn update_dst(&mut self, utc: Timestamp) {
        self.dst_offset_hours = i32::from(self.dst_active_at(utc));
    }

    /// Synchronise against the clock's authoritative source.
    ///
    /// On success the DST offset is re-evaluated, `setter` (if any) receives
    /// the new local calendar time and the sync tick is recorded. Returns
    /// whether the clock was synced on this call. A failure is recorded so
    /// [`check_sync`](Self::check_sync) waits out the retry backoff.
    pub fn set_clock(&mut self, setter: Option<ClockSetter<'_>>) -> bool {
        let Some(network_utc) = self.clock.network_time() else {
            self.failed_at = Some(self.ticks_ms());
            log_pipe!();
            log_warning!("Clock sync failed, continuing on local time");
            return false;
        };
        self.failed_at = None;

        self.correction_secs = network_utc - self.clock.utc_now();
        self.update_dst(network_utc);

        let local = calendar::civil(network_utc + self.offset_secs());
        if let Some(setter) = setter {
            setter(local);
        }
        self.synced_at = Some(self.ticks_ms());

        log_block_start!(
            "Clock synced: {}{}",
            local.format("%Y-%m-%d %H:%M:%S"),
            if self.is_dst_active() { " (DST)" } else { "" }
        );
        true
    }

    /// Whether the last sync happened within the resync interval.
    pub fn is_synced(&self) -> bool {
        match self.synced_at {
            None => false,
            Some(at) => {
                let elapsed = ticks_diff(self.ticks_ms(), at);
                elapsed >= 0 && (elapsed as u32) < self.resync_interval_ms
            }
        }
    }

    /// Whether a failed attempt happened within the retry backoff.
    fn is_backing_off(&self) -> bool {
        self.failed_at.is_some_and(|at| {
            let elapsed = ticks_diff(self.ticks_ms(), at);
            elapsed >= 0 && (elapsed as u32) < CLOCK_RETRY_BACKOFF_MS
        })
    }

    /// Resync if the previous sync has gone stale; a no-op returning `false` otherwise.
    ///
    /// After a failed attempt no new one is made until the retry backoff has passed.
    pub fn check_sync(&mut self, setter: Option<ClockSetter<'_>>) -> bool {
        if self.is_synced() || self.is_backing_off() {
            return false;
        }
        self.set_clock(setter)
    }

    /// `Fri 19:05.07` for a local-frame timestamp.
    pub fn format(&self, ts: Timestamp) -> String {
        calendar::format_timestamp(ts)
    }

    /// `06 Aug` for a local-frame timestamp.
    pub fn day_month_label(&self, ts: Timestamp) -> String {
        calendar::day_month_label(ts)
    }

    /// Local-frame timestamp of sunset on the local calendar `date`.
    ///
    /// The daylight-saving offset is the one in force at that sunset, not now.
    pub fn sunset_on(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Timestamp {
        let jd = geo::julian_day(date.day(), date.month(), date.year());
        let (hour, minute) = geo::sunset(jd, latitude, longitude);
        let utc = calendar::timestamp_of(date, 0, 0)
            + i64::from(hour) * SECONDS_PER_HOUR
            + i64::from(minute) * SECONDS_PER_MINUTE;
        let dst_hours = i32::from(self.dst_active_at(utc));
        utc + i64::from(self.utc_offset_hours + dst_hours) * SECONDS_PER_HOUR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::source::SimulatedClock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    // 2023-07-01 12:00:00 UTC
    const SUMMER: Timestamp = 1_688_212_800;
    // 2023-01-15 12:00:00 UTC
    const WINTER: Timestamp = 1_673_784_000;

    fn local_at(utc: Timestamp, offset: i32, region: &str) -> (Arc<SimulatedClock>, LocalTime) {
        let clock = Arc::new(SimulatedClock::starting_at(utc));
        let time = LocalTime::new(clock.clone(), offset, region);
        (clock, time)
    }

    #[test]
    fn test_now_applies_offset_and_dst() {
        let (_, summer) = local_at(SUMMER, 0, "EU");
        assert_eq!(summer.now(), SUMMER + 3600);

        let (_, winter) = local_at(WINTER, 0, "EU");
        assert_eq!(winter.now(), WINTER);

        let (_, eastern) = local_at(SUMMER, -5, "NA");
        assert_eq!(eastern.now(), SUMMER - 4 * 3600);

        let (_, plain) = local_at(SUMMER, 2, "none");
        assert_eq!(plain.now(), SUMMER + 2 * 3600);
    }

    #[test]
    fn test_unknown_region_disables_dst() {
        crate::logger::Log::set_enabled(false);
        let (_, time) = local_at(SUMMER, 1, "AU");
        assert!(time.dst_region().is_none());
        assert_eq!(time.offset_secs(), 3600);
    }

    #[test]
    fn test_set_clock_calls_setter_with_local_time() {
        crate::logger::Log::set_enabled(false);
        let (_, mut time) = local_at(SUMMER, 0, "EU");
        let mut seen = None;
        let mut setter = |dt: NaiveDateTime| seen = Some(dt);
        assert!(time.set_clock(Some(&mut setter)));
        assert_eq!(seen.map(|dt| dt.format("%H:%M").to_string()).as_deref(), Some("13:00"));
        assert!(time.is_synced());
    }

    #[test]
    fn test_check_sync_is_idempotent_until_interval_expires() {
        crate::logger::Log::set_enabled(false);
        let (clock, mut time) = local_at(WINTER, 0, "EU");
        assert!(!time.is_synced());
        assert!(time.check_sync(None));
        assert!(!time.check_sync(None));
        assert!(!time.check_sync(None));

        clock.advance(Duration::from_millis(u64::from(CLOCK_RESYNC_INTERVAL_MS) - 1));
        assert!(!time.check_sync(None));

        clock.advance(Duration::from_millis(1));
        assert!(!time.is_synced());
        assert!(time.check_sync(None));
    }

    #[test]
    fn test_sunset_on_shifts_into_local_frame() {
        let (_, utc) = local_at(SUMMER, 0, "none");
        let (_, bst) = local_at(SUMMER, 0, "EU");
        let date = NaiveDate::from_ymd_opt(2022, 8, 26).unwrap();
        let sunset_utc = utc.sunset_on(date, 51.5, -0.126);
        assert_eq!(bst.sunset_on(date, 51.5, -0.126), sunset_utc + 3600);
        assert_eq!(&calendar::clock_label(sunset_utc)[..2], "18");
    }

    #[test]
    fn test_sunset_on_uses_dst_of_target_date() {
        let (_, summer) = local_at(SUMMER, 0, "EU");
        assert!(summer.is_dst_active());
        let midwinter = NaiveDate::from_ymd_opt(2023, 12, 21).unwrap();
        // London sunset is about 15:53 GMT on the winter solstice
        let sunset = summer.sunset_on(midwinter, 51.5, -0.126);
        assert_eq!(&calendar::clock_label(sunset)[..2], "15");

        let (_, winter) = local_at(WINTER, 0, "EU");
        assert_eq!(winter.sunset_on(midwinter, 51.5, -0.126), sunset);
        let midsummer = NaiveDate::from_ymd_opt(2023, 6, 21).unwrap();
        assert_eq!(
            winter.sunset_on(midsummer, 51.5, -0.126),
            summer.sunset_on(midsummer, 51.5, -0.126)
        );
    }

    #[test]
    fn test_sunset_on_north_america_uses_standard_frame() {
        let (_, eastern) = local_at(WINTER, -5, "NA");
        let (_, fixed) = local_at(WINTER, -5, "none");
        let july = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        let january = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        assert_eq!(
            eastern.sunset_on(july, 40.7128, -74.006),
            fixed.sunset_on(july, 40.7128, -74.006) + 3600
        );
        assert_eq!(
            eastern.sunset_on(january, 40.7128, -74.006),
            fixed.sunset_on(january, 40.7128, -74.006)
        );
    }

    /// Clock whose time server is never reachable.
    struct OfflineClock {
        inner: SimulatedClock,
        attempts: AtomicU32,
    }

    impl ClockSource for OfflineClock {
        fn utc_now(&self) -> Timestamp {
            self.inner.utc_now()
        }

        fn ticks_ms(&self) -> u32 {
            self.inner.ticks_ms()
        }

        fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration);
        }

        fn network_time(&self) -> Option<Timestamp> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    #[test]
    fn test_failed_sync_backs_off_before_retrying() {
        crate::logger::Log::set_enabled(false);
        let clock = Arc::new(OfflineClock {
            inner: SimulatedClock::starting_at(WINTER),
            attempts: AtomicU32::new(0),
        });
        let mut time = LocalTime::new(clock.clone(), 0, "EU");

        for _ in 0..5 {
            assert!(!time.check_sync(None));
        }
        assert_eq!(clock.attempts.load(Ordering::SeqCst), 1);
        assert!(!time.is_synced());

        clock
            .inner
            .advance(Duration::from_millis(u64::from(CLOCK_RETRY_BACKOFF_MS) - 1));
        assert!(!time.check_sync(None));
        assert_eq!(clock.attempts.load(Ordering::SeqCst), 1);

        clock.inner.advance(Duration::from_millis(1));
        assert!(!time.check_sync(None));
        assert_eq!(clock.attempts.load(Ordering::SeqCst), 2);
    }
}
