//! Request pacing and throttling retry.
//!
//! Every outbound request goes through [`RateGate::acquire`], which enforces a
//! minimum spacing since the previous request plus a random jitter. The
//! last-request timestamp is held under an async mutex for the whole wait, so
//! concurrent detail fetches queue up behind each other instead of firing
//! together.
//!
//! [`RateGate::run`] wraps a fetch with exponential backoff on throttling
//! responses (429/503). Other errors are returned immediately.

use crate::config::Config;
use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Paces outbound requests and retries throttled ones.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    jitter_min: Duration,
    jitter_max: Duration,
    max_attempts: u32,
    last_request: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Creates a gate. `max_attempts` counts the first try; zero is treated as one.
    pub fn new(
        min_interval: Duration,
        jitter_min: Duration,
        jitter_max: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            min_interval,
            jitter_min,
            jitter_max,
            max_attempts: max_attempts.max(1),
            last_request: Mutex::new(None),
        }
    }

    /// Creates a gate from the pacing settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.min_interval_ms),
            Duration::from_millis(config.jitter_min_ms),
            Duration::from_millis(config.jitter_max_ms),
            config.max_attempts,
        )
    }

    /// Suspends until the next request may be issued, then records the issuance time.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Spacing requests: waiting {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }

        let jitter = self.jitter();
        if !jitter.is_zero() {
            debug!("Jitter {}ms", jitter.as_millis());
            tokio::time::sleep(jitter).await;
        }

        *last = Some(Instant::now());
    }

    /// Runs `operation` behind the gate, retrying throttled responses with
    /// `min_interval * 2^attempt` backoff up to the attempt limit.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0u32;

        loop {
            self.acquire().await;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_throttled() && attempt + 1 < self.max_attempts => {
                    let backoff = self.min_interval.saturating_mul(1u32 << attempt.min(16));
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Throttled, backing off before retry"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let min = self.jitter_min.as_millis() as u64;
        let max = self.jitter_max.as_millis() as u64;
        Duration::from_millis(rand::random_range(min..max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn throttled() -> TransportError {
        TransportError::Throttled { status: 429, url: "https://www.gsmarena.com".to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_acquire_spaced() {
        let gate = RateGate::new(Duration::from_secs(5), Duration::ZERO, Duration::ZERO, 3);

        gate.acquire().await;
        let first_done = Instant::now();
        gate.acquire().await;

        assert!(first_done.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait_for_spacing() {
        let gate = RateGate::new(Duration::from_secs(5), Duration::ZERO, Duration::ZERO, 3);
        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_within_bounds() {
        let gate =
            RateGate::new(Duration::ZERO, Duration::from_secs(1), Duration::from_secs(3), 3);
        for _ in 0..10 {
            let start = Instant::now();
            gate.acquire().await;
            let waited = start.elapsed();
            assert!(waited >= Duration::from_secs(1));
            assert!(waited < Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_serialized() {
        let gate = Arc::new(RateGate::new(
            Duration::from_secs(5),
            Duration::ZERO,
            Duration::ZERO,
            3,
        ));
        let start = Instant::now();

        let a = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.acquire().await }
        });
        let b = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.acquire().await }
        });
        a.await.unwrap();
        b.await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_throttled_then_succeeds() {
        let gate = RateGate::new(Duration::from_secs(5), Duration::ZERO, Duration::ZERO, 3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result = gate
            .run(|| {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(throttled())
                    } else {
                        Ok("<html></html>")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "<html></html>");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let gate = RateGate::new(Duration::from_secs(5), Duration::ZERO, Duration::ZERO, 3);
        let start = Instant::now();

        let result: Result<(), _> = gate.run(|| async { Err(throttled()) }).await;
        assert!(result.is_err());

        // 5s backoff + 10s backoff; spacing is already satisfied after each backoff
        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let gate = RateGate::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, 3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<(), _> = gate
            .run(|| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(throttled())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(TransportError::Throttled { .. })));
    }

    #[tokio::test]
    async fn test_does_not_retry_other_errors() {
        let gate = RateGate::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, 3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<(), _> = gate
            .run(|| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TransportError::Status { status: 404, url: "https://x".to_string() })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TransportError::Status { status: 404, .. })));
    }

    #[test]
    fn test_zero_attempts_treated_as_one() {
        let gate = RateGate::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, 0);
        assert_eq!(gate.max_attempts, 1);
    }
}
