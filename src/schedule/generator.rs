//! Schedule generation: anchor resolution, duty-cycle synthesis and pruning.
//!
//! For every outlet the generator lays out `n` on/off sequences inside the
//! configured window starting at the (jittered) anchor. The on-time budget is
//! split evenly across the sequences, the off-time budget across the gaps
//! between them, and every segment gets its own jitter. The combined list is
//! stably sorted by start and stripped of events that already ended.

use chrono::Duration;

use super::event::{Event, OutletId};
use super::random::{RandomSource, jitter_secs};
use crate::config::Config;
use crate::constants::SECONDS_PER_MINUTE;
use crate::time::{LocalTime, Timestamp, calendar};

/// What the generator needs to know about one outlet.
#[derive(Debug, Clone, PartialEq)]
pub struct OutletPlan {
    pub id: OutletId,
    pub label: Option<String>,
    /// Relay logic is reversed: "off" energises the load.
    pub inverted: bool,
}

/// Nominal start of the next window, before jitter.
///
/// Uses the fixed start time or the day's sunset. If that window has already
/// fully elapsed the anchor moves to the following day (recomputing sunset
/// for that date).
pub fn resolve_anchor(config: &Config, time: &LocalTime, now: Timestamp) -> Timestamp {
    let anchor_on = |date| {
        if config.use_sunset {
            time.sunset_on(date, config.latitude, config.longitude)
        } else {
            calendar::timestamp_of(date, config.start_hour, config.start_minute)
        }
    };

    let today = calendar::civil(now).date();
    let duration = i64::from(config.duration_minutes) * SECONDS_PER_MINUTE;
    let candidate = anchor_on(today);
    if candidate + duration < now {
        anchor_on(today + Duration::days(1))
    } else {
        candidate
    }
}

/// Events for a single outlet, in generation order.
pub fn generate_for_outlet(
    config: &Config,
    anchor: Timestamp,
    outlet: &OutletPlan,
    rng: &mut dyn RandomSource,
) -> Vec<Event> {
    let origin = anchor + jitter_secs(rng, config.max_jitter_minutes);
    let sequences = i64::from(rng.draw(config.min_sequences, config.max_sequences).max(1));

    let duration = i64::from(config.duration_minutes) * SECONDS_PER_MINUTE;
    let on_total = duration * i64::from(config.on_percent) / 100;
    let mut off_per_gap = duration - on_total;
    if sequences > 1 {
        off_per_gap /= sequences - 1;
    }
    let on_per_sequence = on_total / sequences;

    let mut segments = Vec::with_capacity(2 * sequences as usize);
    for _ in 0..sequences {
        segments.push((on_per_sequence + jitter_secs(rng, config.max_jitter_minutes)).max(1));
        segments.push((off_per_gap + jitter_secs(rng, config.max_jitter_minutes)).max(1));
    }

    let mut events = Vec::with_capacity(segments.len() + 1);
    let mut cursor = origin;
    for (index, length) in segments.into_iter().enumerate() {
        let energised = index % 2 == 0;
        events.push(Event::new(
            cursor,
            cursor + length,
            outlet.id,
            energised != outlet.inverted,
            outlet.label.clone(),
        ));
        cursor += length;
    }

    if outlet.inverted {
        events.push(Event::new(
            cursor,
            cursor + off_per_gap.max(1),
            outlet.id,
            false,
            outlet.label.clone(),
        ));
    }

    events
}

/// Stable sort by start; equal starts keep generation order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_key(|event| event.start);
}

/// Drop the leading events that ended before `now`, returning how many went.
///
/// Scans from the head and stops at the first event still current.
pub fn prune_expired(events: &mut Vec<Event>, now: Timestamp) -> usize {
    let expired = events.iter().take_while(|event| event.end < now).count();
    events.drain(..expired);
    expired
}

/// Full schedule for all outlets: generated, sorted and pruned.
pub fn generate(
    config: &Config,
    outlets: &[OutletPlan],
    time: &LocalTime,
    now: Timestamp,
    rng: &mut dyn RandomSource,
) -> Vec<Event> {
    let anchor = resolve_anchor(config, time, now);
    log_decorated!(
        "Next window starts {} ({})",
        time.format(anchor),
        if config.use_sunset { "sunset" } else { "fixed time" }
    );

    let mut events: Vec<Event> = outlets
        .iter()
        .flat_map(|outlet| generate_for_outlet(config, anchor, outlet, rng))
        .collect();
    sort_events(&mut events);

    let expired = prune_expired(&mut events, now);
    if expired > 0 {
        log_decorated!("Removed {} expired event(s)", expired);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::schedule::random::ScriptedRandom;
    use crate::time::SimulatedClock;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn fixed_config() -> Config {
        Config {
            use_sunset: false,
            start_hour: 19,
            start_minute: 0,
            duration_minutes: TEST_STANDARD_DURATION,
            on_percent: TEST_STANDARD_ON_PERCENT,
            max_jitter_minutes: 0,
            min_sequences: 2,
            max_sequences: 2,
            dst_region: "none".into(),
            ..Config::default()
        }
    }

    fn utc_time(now: Timestamp) -> LocalTime {
        LocalTime::new(Arc::new(SimulatedClock::starting_at(now)), 0, "none")
    }

    fn plan(id: OutletId, inverted: bool) -> OutletPlan {
        OutletPlan {
            id,
            label: Some(format!("plug {id}")),
            inverted,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> Timestamp {
        calendar::timestamp_of(NaiveDate::from_ymd_opt(2023, 3, day).unwrap(), hour, minute)
    }

    #[test]
    fn test_anchor_today_while_window_pending() {
        let config = fixed_config();
        let now = at(10, 12, 0);
        assert_eq!(resolve_anchor(&config, &utc_time(now), now), at(10, 19, 0));
        // Still inside the window: keep today's anchor
        let now = at(10, 19, 45);
        assert_eq!(resolve_anchor(&config, &utc_time(now), now), at(10, 19, 0));
    }

    #[test]
    fn test_anchor_moves_to_tomorrow_after_window() {
        let config = fixed_config();
        let now = at(10, 20, 1);
        assert_eq!(resolve_anchor(&config, &utc_time(now), now), at(11, 19, 0));
    }

    #[test]
    fn test_sunset_anchor_recomputed_for_tomorrow() {
        let config = Config {
            use_sunset: true,
            latitude: TEST_LONDON_LATITUDE,
            longitude: TEST_LONDON_LONGITUDE,
            ..fixed_config()
        };
        let now = at(10, 23, 0);
        let time = utc_time(now);
        let tomorrow = NaiveDate::from_ymd_opt(2023, 3, 11).unwrap();
        assert_eq!(
            resolve_anchor(&config, &time, now),
            time.sunset_on(tomorrow, TEST_LONDON_LATITUDE, TEST_LONDON_LONGITUDE)
        );
    }

    #[test]
    fn test_two_sequence_layout() {
        let config = fixed_config();
        let anchor = at(10, 19, 0);
        // Anchor jitter draw (0 -> +1 s), then two sequences, then +1 s for every segment
        let mut rng = ScriptedRandom::new([0, 2]);
        let events = generate_for_outlet(&config, anchor, &plan(0, false), &mut rng);

        let layout: Vec<_> = events
            .iter()
            .map(|e| (e.start - anchor, e.end - anchor, e.state))
            .collect();
        assert_eq!(
            layout,
            vec![
                (1, 1442, true),
                (1442, 2163, false),
                (2163, 3604, true),
                (3604, 4325, false),
            ]
        );
        assert!(events.iter().all(|e| e.label.as_deref() == Some("plug 0")));
    }

    #[test]
    fn test_inverted_outlet_flips_states_and_restores_idle() {
        let config = fixed_config();
        let anchor = at(10, 19, 0);
        let mut rng = ScriptedRandom::new([0, 2]);
        let events = generate_for_outlet(&config, anchor, &plan(1, true), &mut rng);

        let states: Vec<bool> = events.iter().map(|e| e.state).collect();
        assert_eq!(states, vec![false, true, false, true, false]);
        let trailing = events.last().unwrap();
        assert_eq!(trailing.start, anchor + 4325);
        assert_eq!(trailing.end, anchor + 4325 + 720);
    }

    #[test]
    fn test_extreme_on_percent_never_yields_empty_segments() {
        let mut rng = StdRng::seed_from_u64(3);
        for on_percent in [1, 99] {
            let config = Config {
                duration_minutes: 1,
                on_percent,
                max_jitter_minutes: 59,
                min_sequences: 1,
                max_sequences: 10,
                ..fixed_config()
            };
            for _ in 0..50 {
                let events = generate_for_outlet(&config, 0, &plan(0, true), &mut rng);
                assert!(events.iter().all(|e| e.start < e.end));
            }
        }
    }

    #[test]
    fn test_generate_prunes_expired_prefix() {
        let config = fixed_config();
        // Half an hour into the window
        let now = at(10, 19, 30);
        let mut rng = ScriptedRandom::new([0, 2]);
        let events = generate(&config, &[plan(0, false)], &utc_time(now), now, &mut rng);
        // The first on segment (ends 19:24:02) is gone
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].start, at(10, 19, 0) + 1442);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut events = vec![
            Event::new(100, 150, 0, true, None),
            Event::new(150, 400, 0, false, None),
            Event::new(200, 210, 1, true, None),
        ];
        assert_eq!(prune_expired(&mut events, 160), 1);
        assert_eq!(prune_expired(&mut events, 160), 0);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_prune_stops_at_first_current_event() {
        // A later event ending early is not removed past a still-current head
        let mut events = vec![
            Event::new(100, 500, 0, true, None),
            Event::new(200, 210, 1, true, None),
        ];
        assert_eq!(prune_expired(&mut events, 300), 0);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut events = vec![
            Event::new(200, 300, 0, true, None),
            Event::new(100, 300, 1, true, None),
            Event::new(100, 300, 2, false, None),
        ];
        sort_events(&mut events);
        let order: Vec<_> = events.iter().map(|e| e.outlet).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
