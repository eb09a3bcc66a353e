//! Reply delivery policy
//!
//! One policy is selected per simulator session and applied to every Echo
//! Request received during it. A policy decides only how many reply
//! instances go out and when each one is due; encoding the reply and
//! actually transmitting it stay with the receive path and the scheduler.

use std::time::{Duration, Instant};

use rand::Rng;

/// Reply delivery policy
///
/// Modes are mutually exclusive for the lifetime of a session. Bounded
/// variants require `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Exactly one reply, due immediately
    Immediate,
    /// A fixed number of identical replies, all due immediately
    FixedCount(u32),
    /// Uniformly many replies in `min..=max` per request; 0 simulates loss
    RandomCount { min: u32, max: u32 },
    /// Exactly one reply, delayed uniformly within `[min_delay, max_delay)`
    Jittered {
        min_delay: Duration,
        max_delay: Duration,
    },
}

impl DeliveryPolicy {
    /// Due times for the replies to one received Echo Request
    ///
    /// Random draws come from the caller's `rng` and are independent
    /// across invocations.
    pub fn due_times<R: Rng>(&self, now: Instant, rng: &mut R) -> Vec<Instant> {
        match *self {
            DeliveryPolicy::Immediate => vec![now],
            DeliveryPolicy::FixedCount(count) => vec![now; count as usize],
            DeliveryPolicy::RandomCount { min, max } => {
                let count = rng.random_range(min..=max);
                vec![now; count as usize]
            }
            DeliveryPolicy::Jittered {
                min_delay,
                max_delay,
            } => {
                let frac: f64 = rng.random();
                let delay = min_delay + (max_delay - min_delay).mul_f64(frac);
                vec![now + delay]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_immediate_single_reply_due_now() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Instant::now();

        let due = DeliveryPolicy::Immediate.due_times(now, &mut rng);
        assert_eq!(due, vec![now]);
    }

    #[test]
    fn test_fixed_count_cardinality() {
        let mut rng = StdRng::seed_from_u64(2);
        let now = Instant::now();

        let due = DeliveryPolicy::FixedCount(4).due_times(now, &mut rng);
        assert_eq!(due.len(), 4);
        assert!(due.iter().all(|&d| d == now));

        let none = DeliveryPolicy::FixedCount(0).due_times(now, &mut rng);
        assert!(none.is_empty());
    }

    #[test]
    fn test_random_count_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let now = Instant::now();
        let policy = DeliveryPolicy::RandomCount { min: 0, max: 2 };

        let mut saw_min = false;
        let mut saw_max = false;
        for _ in 0..400 {
            let due = policy.due_times(now, &mut rng);
            assert!(due.len() <= 2);
            assert!(due.iter().all(|&d| d == now));
            saw_min |= due.is_empty();
            saw_max |= due.len() == 2;
        }
        // Both endpoints of the inclusive range must be reachable
        assert!(saw_min);
        assert!(saw_max);
    }

    #[test]
    fn test_random_count_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(4);
        let now = Instant::now();
        let policy = DeliveryPolicy::RandomCount { min: 3, max: 3 };

        for _ in 0..16 {
            assert_eq!(policy.due_times(now, &mut rng).len(), 3);
        }
    }

    #[test]
    fn test_jittered_delay_within_window() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = Instant::now();
        let policy = DeliveryPolicy::Jittered {
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(150),
        };

        for _ in 0..200 {
            let due = policy.due_times(now, &mut rng);
            assert_eq!(due.len(), 1);
            let delay = due[0] - now;
            assert!(delay >= Duration::from_millis(50));
            assert!(delay < Duration::from_millis(150));
        }
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            #[test]
            fn prop_random_count_within_bounds(
                min in 0u32..5,
                spread in 0u32..5,
                seed in any::<u64>(),
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let now = Instant::now();
                let policy = DeliveryPolicy::RandomCount { min, max: min + spread };

                let count = policy.due_times(now, &mut rng).len() as u32;
                prop_assert!(count >= min);
                prop_assert!(count <= min + spread);
            }

            #[test]
            fn prop_jittered_delay_within_bounds(
                min_ms in 0u64..200,
                spread_ms in 1u64..200,
                seed in any::<u64>(),
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let now = Instant::now();
                let policy = DeliveryPolicy::Jittered {
                    min_delay: Duration::from_millis(min_ms),
                    max_delay: Duration::from_millis(min_ms + spread_ms),
                };

                let due = policy.due_times(now, &mut rng);
                prop_assert_eq!(due.len(), 1);
                prop_assert!(due[0] >= now + Duration::from_millis(min_ms));
                prop_assert!(due[0] < now + Duration::from_millis(min_ms + spread_ms));
            }
        }
    }
}
