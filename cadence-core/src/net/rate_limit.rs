//! Token bucket rate limiter for provider request budgets.
//!
//! Full-refill variant: once the refill interval has elapsed the bucket
//! resets to capacity in one step, and an empty bucket makes the caller sit
//! out exactly one interval before being granted a token unconditionally.
//! Deliberately coarser than a trickle-refill leaky bucket; it matches how
//! the providers account their quotas and guarantees forward progress.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Per-provider admission control for outbound calls.
///
/// One instance exists per provider for the whole process and is shared by
/// every transfer via `Arc`; the internal async mutex serializes
/// concurrent acquirers against the shared budget.
#[derive(Debug)]
pub struct RateLimiter {
    /// Provider label for log lines
    name: &'static str,
    capacity: u32,
    refill_interval: Duration,
    state: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a bucket starting full.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    pub fn new(name: &'static str, capacity: u32, refill_interval: Duration) -> Self {
        assert!(capacity > 0, "Rate limiter capacity must be greater than zero");

        Self {
            name,
            capacity,
            refill_interval,
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Blocks until a token is available, then consumes one.
    ///
    /// If the bucket is empty the caller sleeps for one full refill
    /// interval while holding the bucket, then the bucket is force-reset
    /// rather than re-checked. Tokens never go negative and refills never
    /// exceed capacity.
    pub async fn acquire(&self) {
        let mut bucket = self.state.lock().await;

        if bucket.last_refill.elapsed() >= self.refill_interval {
            bucket.tokens = self.capacity;
            bucket.last_refill = Instant::now();
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            return;
        }

        tracing::debug!(
            provider = self.name,
            wait_ms = self.refill_interval.as_millis() as u64,
            "rate budget exhausted, waiting for refill"
        );
        sleep(self.refill_interval).await;

        bucket.tokens = self.capacity.saturating_sub(1);
        bucket.last_refill = Instant::now();
    }

    /// Bucket capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens currently available, after applying any due refill.
    pub async fn available_tokens(&self) -> u32 {
        let mut bucket = self.state.lock().await;
        if bucket.last_refill.elapsed() >= self.refill_interval {
            bucket.tokens = self.capacity;
            bucket.last_refill = Instant::now();
        }
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn acquire_within_capacity_does_not_wait() {
        let limiter = RateLimiter::new("test", 3, Duration::from_millis(1000));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available_tokens().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_bucket_waits_one_refill_interval() {
        let limiter = RateLimiter::new("test", 2, Duration::from_millis(1000));

        limiter.acquire().await;
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
        // Force-reset granted one token; capacity - 1 remain.
        assert_eq!(limiter.available_tokens().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_interval_refills_to_capacity() {
        let limiter = RateLimiter::new("test", 2, Duration::from_millis(500));

        limiter.acquire().await;
        limiter.acquire().await;

        sleep(Duration::from_millis(501)).await;

        // Refill happened, so two immediate acquisitions succeed.
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new("test", 2, Duration::from_millis(100));

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(limiter.available_tokens().await, 2);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than zero")]
    fn zero_capacity_panics() {
        RateLimiter::new("test", 0, Duration::from_millis(1000));
    }
}
