//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Backoff schedule between establishment tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Cap on the exponential part (jitter is added on top).
    pub max: Duration,
    /// Upper bound of the random jitter term.
    pub jitter_max: Duration,
}

impl BackoffPolicy {
    /// Delay before retry `attempt` (0-based), using the thread-local RNG.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::thread_rng())
    }

    /// Delay before retry `attempt` with a caller-supplied RNG.
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        calculate_backoff(
            attempt,
            self.base.as_millis() as u64,
            self.max.as_millis() as u64,
            self.jitter_max.as_millis() as u64,
            rng,
        )
    }
}

/// Calculate `min(base * 2^attempt, max) + jitter`, jitter in `0..=jitter_max`.
pub fn calculate_backoff<R: Rng + ?Sized>(
    attempt: u32,
    base_ms: u64,
    max_ms: u64,
    jitter_max_ms: u64,
    rng: &mut R,
) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter = if jitter_max_ms > 0 {
        rng.gen_range(0..=jitter_max_ms)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(100),
            max: Duration::from_millis(2000),
            jitter_max: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let mut rng = StdRng::seed_from_u64(7);

        let b0 = calculate_backoff(0, 100, 2000, 0, &mut rng);
        assert_eq!(b0, Duration::from_millis(100));

        let b1 = calculate_backoff(1, 100, 2000, 0, &mut rng);
        assert_eq!(b1, Duration::from_millis(200));

        let max = calculate_backoff(10, 100, 1000, 0, &mut rng);
        assert_eq!(max, Duration::from_millis(1000));
    }

    #[test]
    fn jitter_is_bounded() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(42);
        for attempt in 0..6 {
            let floor = (100u64 << attempt).min(2000);
            for _ in 0..200 {
                let d = policy.delay_with(attempt, &mut rng).as_millis() as u64;
                assert!(d >= floor, "attempt {attempt}: {d} < {floor}");
                assert!(d <= floor + 50, "attempt {attempt}: {d} > {}", floor + 50);
            }
        }
    }

    #[test]
    fn delays_grow_in_expectation() {
        let policy = policy();
        let mut rng = StdRng::seed_from_u64(1);
        let mean = |attempt: u32, rng: &mut StdRng| -> f64 {
            let total: u128 = (0..500).map(|_| policy.delay_with(attempt, rng).as_millis()).sum();
            total as f64 / 500.0
        };

        let mut previous = 0.0;
        for attempt in 0..8 {
            let m = mean(attempt, &mut rng);
            // Flat once capped; allow sampling noise there.
            assert!(m + 5.0 >= previous, "attempt {attempt} mean {m} < {previous}");
            previous = m;
        }
    }

    #[test]
    fn huge_attempt_saturates() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = calculate_backoff(200, u64::MAX, u64::MAX, 10, &mut rng);
        assert_eq!(d, Duration::from_millis(u64::MAX));
    }
}
