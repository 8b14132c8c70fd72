//! Injectable randomness for schedule generation.

use rand::Rng;
use rand::rngs::StdRng;

use crate::constants::SECONDS_PER_MINUTE;

/// Source of uniform integer draws.
pub trait RandomSource {
    /// Uniform integer in `low..=high`.
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

impl RandomSource for StdRng {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.gen_range(low..=high)
    }
}

/// Jitter in seconds for a bound of `max_minutes`.
///
/// Draws `r` in `0..=max_minutes` and recentres it, giving
/// `r * 60 - max_minutes * 30`, i.e. within half the bound either side of
/// zero. An exact zero becomes one second.
pub fn jitter_secs(rng: &mut dyn RandomSource, max_minutes: u32) -> i64 {
    let r = i64::from(rng.draw(0, max_minutes));
    let secs = r * SECONDS_PER_MINUTE - i64::from(max_minutes) * SECONDS_PER_MINUTE / 2;
    if secs == 0 { 1 } else { secs }
}

/// Replays a fixed list of draws, clamped into the requested range.
///
/// Once the script runs out every draw returns `low`.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: std::collections::VecDeque<u32>,
}

#[cfg(any(test, feature = "testing-support"))]
impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl RandomSource for ScriptedRandom {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        self.values
            .pop_front()
            .map_or(low, |value| value.clamp(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_jitter_recentres_draw() {
        let mut rng = ScriptedRandom::new([0, 10, 3, 5]);
        assert_eq!(jitter_secs(&mut rng, 10), -300);
        assert_eq!(jitter_secs(&mut rng, 10), 300);
        assert_eq!(jitter_secs(&mut rng, 10), -120);
        // Exact centre maps to one second
        assert_eq!(jitter_secs(&mut rng, 10), 1);
    }

    #[test]
    fn test_zero_bound_gives_one_second() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(jitter_secs(&mut rng, 0), 1);
        }
    }

    #[test]
    fn test_odd_bound_never_hits_zero() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let secs = jitter_secs(&mut rng, 7);
            assert!((-210..=210).contains(&secs));
            assert_eq!((secs + 210) % 60, 0);
        }
    }

    #[test]
    fn test_scripted_random_clamps_and_exhausts() {
        let mut rng = ScriptedRandom::new([50]);
        assert_eq!(rng.draw(1, 3), 3);
        assert_eq!(rng.draw(2, 9), 2);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: jitter stays within half the bound either side of zero and is never zero
            #[test]
            fn prop_jitter_bounded(seed in any::<u64>(), max in 0u32..60) {
                let mut rng = StdRng::seed_from_u64(seed);
                let secs = jitter_secs(&mut rng, max);
                let half = i64::from(max) * 30;
                prop_assert!(secs != 0);
                prop_assert!(secs == 1 || (-half..=half).contains(&secs));
            }
        }
    }
}
