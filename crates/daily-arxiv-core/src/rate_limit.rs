use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Time source for [`RateLimiter`], swappable in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Enforces a minimum delay between successive calls. The only state is the time of
/// the last call; callers share one limiter through an `Arc`.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(TokioClock))
    }

    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous call, then records now.
    /// Concurrent callers queue on the lock, so calls are serialized.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = self.clock.now().saturating_duration_since(t);
            if elapsed < self.min_interval {
                self.clock.sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(self.clock.now());
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(3), clock.clone());
        limiter.acquire().await;
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn consecutive_calls_are_spaced_by_interval() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(3), clock.clone());

        let start = clock.now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3)]);
        assert!(clock.now() - start >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn waits_only_for_the_remainder() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(3), clock.clone());

        limiter.acquire().await;
        clock.advance(Duration::from_secs(2));
        limiter.acquire().await;
        clock.advance(Duration::from_secs(5));
        limiter.acquire().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn zero_interval_never_sleeps() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::ZERO, clock.clone());
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(clock.sleeps().is_empty());
    }
}
