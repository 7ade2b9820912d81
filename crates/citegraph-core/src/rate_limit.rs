//! Minimum-spacing pacer for calls to rate-limited external services.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::delay_from_secs;

/// Guarantees at least `min_interval` between consecutive paced calls.
///
/// The interval is measured from the moment the previous `wait` returned.
/// The first call never sleeps.
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Build from a delay in seconds; negative or NaN means no delay and
    /// oversized values are capped at `MAX_DELAY_SECS`.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(delay_from_secs(secs))
    }

    /// A limiter that never sleeps.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleep until the minimum interval since the previous call has elapsed.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("Rate limiter sleeping {:?}", remaining);
                tokio::time::sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_does_not_sleep() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let interval = Duration::from_millis(40);
        let limiter = RateLimiter::new(interval);

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= interval);
        limiter.wait().await;
        assert!(start.elapsed() >= interval * 2);
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let limiter = RateLimiter::from_secs_f64(-1.0);
        assert_eq!(limiter.min_interval(), Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_huge_interval_is_capped() {
        assert_eq!(RateLimiter::from_secs_f64(1e300).min_interval(), Duration::from_secs(3600));
        assert_eq!(RateLimiter::from_secs_f64(f64::INFINITY).min_interval(), Duration::from_secs(3600));
        assert_eq!(RateLimiter::from_secs_f64(f64::NAN).min_interval(), Duration::ZERO);
    }
}
