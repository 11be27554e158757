// src/backoff.rs
// Exponential delay schedule with an upper clamp

use crate::config::RetryConfig;
use std::time::Duration;

/// The waits of a single invocation, in order.
///
/// Yields `tries - 1` durations; the i-th is `min(delay * backoff^i, max_delay)`.
/// The running wait is clamped before it is multiplied again. A product that
/// no longer fits in a `Duration` saturates at `Duration::MAX`, which the
/// clamp then brings back to `max_delay`.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    remaining: u32,
    wait: Duration,
    backoff: f64,
    max_delay: Duration,
}

impl BackoffSchedule {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            remaining: config.tries().saturating_sub(1),
            wait: config.delay(),
            backoff: config.backoff(),
            max_delay: config.max_delay(),
        }
    }

    fn grow(&self, wait: Duration) -> Duration {
        // backoff == 1 keeps the exact duration instead of a float round trip
        if self.backoff == 1.0 {
            return wait;
        }
        Duration::try_from_secs_f64(wait.as_secs_f64() * self.backoff).unwrap_or(Duration::MAX)
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let clamped = self.wait.min(self.max_delay);
        self.wait = self.grow(clamped);
        Some(clamped)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BackoffSchedule {}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(schedule: BackoffSchedule) -> Vec<f64> {
        schedule.map(|wait| wait.as_secs_f64()).collect()
    }

    #[test]
    fn test_default_schedule() {
        let schedule = RetryConfig::default().schedule();

        assert_eq!(schedule.len(), 5);
        assert_eq!(secs(schedule), vec![1.0, 2.0, 4.0, 8.0, 16.0]);
    }

    #[test]
    fn test_schedule_clamped_at_max_delay() {
        let config = RetryConfig::new(8.0, 1.0, 2.0, 10.0).unwrap();
        assert_eq!(
            secs(config.schedule()),
            vec![1.0, 2.0, 4.0, 8.0, 10.0, 10.0, 10.0]
        );
    }

    #[test]
    fn test_single_try_has_no_waits() {
        let config = RetryConfig::new(1.0, 1.0, 2.0, 32.0).unwrap();
        assert_eq!(config.schedule().next(), None);
    }

    #[test]
    fn test_first_wait_clamped() {
        // delay == max_delay: every wait is the same
        let config = RetryConfig::new(4.0, 5.0, 3.0, 5.0).unwrap();
        assert_eq!(secs(config.schedule()), vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_zero_delay_stays_zero() {
        let config = RetryConfig::new(4.0, 0.0, 10.0, 1.0).unwrap();
        assert!(config.schedule().all(|wait| wait == Duration::ZERO));
    }

    #[test]
    fn test_long_schedule_does_not_overflow() {
        let config = RetryConfig::new(2000.0, 1.0, 1000.0, 60.0).unwrap();
        let waits: Vec<Duration> = config.schedule().collect();

        assert_eq!(waits.len(), 1999);
        assert_eq!(waits[0], Duration::from_secs(1));
        assert!(waits[1..].iter().all(|wait| *wait == Duration::from_secs(60)));
    }

    #[test]
    fn test_unbounded_max_delay_saturates() {
        let config = RetryConfig::builder()
            .tries(40)
            .backoff(10.0)
            .max_delay(Duration::MAX)
            .build()
            .unwrap();
        let waits: Vec<Duration> = config.schedule().collect();

        assert_eq!(waits.len(), 39);
        assert_eq!(waits[0], Duration::from_secs(1));
        assert_eq!(waits[2], Duration::from_secs(100));
        assert_eq!(*waits.last().unwrap(), Duration::MAX);
        assert!(waits.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_constant_backoff_keeps_exact_wait() {
        let delay = Duration::new(1_000_000_000, 1);
        let config = RetryConfig::builder()
            .tries(4)
            .delay(delay)
            .backoff(1.0)
            .max_delay(Duration::MAX)
            .build()
            .unwrap();

        assert_eq!(config.schedule().collect::<Vec<_>>(), vec![delay; 3]);
    }

    #[test]
    fn test_matches_closed_form() {
        let config = RetryConfig::new(6.0, 0.5, 3.0, 20.0).unwrap();

        for (i, wait) in config.schedule().enumerate() {
            let expected = (0.5 * 3f64.powi(i as i32)).min(20.0);
            assert!((wait.as_secs_f64() - expected).abs() < 1e-9);
        }
    }
}
