//! Capped exponential reconnect schedule.

use std::time::Duration;

/// Delay before retry number `failures` (1-based): `base * 2^(failures-1)`,
/// exponent capped at 8, delay capped at `max`.
pub fn retry_backoff(base: Duration, max: Duration, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(8) as i32;
    let secs = (base.as_secs_f64() * 2.0_f64.powi(exponent)).min(max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Consecutive-failure counter driving [`retry_backoff`].
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base,
            max,
            max_attempts,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait, or `None` once the
    /// attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(limit) = self.max_attempts {
            if self.failures >= limit {
                return None;
            }
        }
        self.failures = self.failures.saturating_add(1);
        Some(retry_backoff(self.base, self.max, self.failures))
    }

    /// Forget past failures after a successful message.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_then_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(60);
        assert_eq!(retry_backoff(base, max, 1), Duration::from_secs(1));
        assert_eq!(retry_backoff(base, max, 2), Duration::from_secs(2));
        assert_eq!(retry_backoff(base, max, 4), Duration::from_secs(8));
        assert_eq!(retry_backoff(base, max, 7), Duration::from_secs(60));
        assert_eq!(retry_backoff(base, max, 500), Duration::from_secs(60));
    }

    #[test]
    fn test_attempt_budget() {
        let mut b = Backoff::new(Duration::from_millis(10), Duration::from_secs(1), Some(2));
        assert_eq!(b.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(b.next_delay(), Some(Duration::from_millis(20)));
        assert_eq!(b.next_delay(), None);
        b.reset();
        assert_eq!(b.failures(), 0);
        assert!(b.next_delay().is_some());
    }
}
