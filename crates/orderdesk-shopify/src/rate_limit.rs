//! Process-wide request pacing for the Shopify Admin API.
//!
//! A single [`RateLimiter`] is shared (via `Arc`) by every client that talks
//! to the same store. Calls through [`RateLimiter::run`] are serialized, and
//! each one starts no sooner than `min_interval` after the previous one
//! *completed*. Pacing is purely time-based; Shopify's call-limit header is
//! reported to callers but never consulted here.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shopify allows roughly 40 requests per minute on the REST bucket.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Completion time of the most recent call; `None` before the first.
    last_completed: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_completed: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits for the pacing window, runs `operation`, and records its
    /// completion time.
    ///
    /// The lock is held for the whole call, so anything `operation` does
    /// (including its own retry sleeps) happens inside one pacing slot.
    pub async fn run<T, F, Fut>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_completed.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis(),
                    "pacing Shopify request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let output = operation().await;
        *last = Some(Instant::now());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(1500));
        let start = Instant::now();
        limiter.run(|| async {}).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(1500));
        let mut starts = Vec::new();

        for _ in 0..4 {
            starts.push(limiter.run(|| async { Instant::now() }).await);
        }

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(1500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn interval_counts_from_completion_not_start() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));

        limiter
            .run(|| tokio::time::sleep(Duration::from_millis(400)))
            .await;
        let finished_first = Instant::now();

        let second_start = limiter.run(|| async { Instant::now() }).await;
        assert!(second_start - finished_first >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_counts_toward_the_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        limiter.run(|| async {}).await;

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let before = Instant::now();
        limiter.run(|| async {}).await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_limiter_serializes_concurrent_tasks() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            let starts = Arc::clone(&starts);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(|| async {
                        starts.lock().await.push(Instant::now());
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut starts = starts.lock().await.clone();
        starts.sort();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }
}
