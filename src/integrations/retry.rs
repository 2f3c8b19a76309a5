//! Bounded retry with exponential backoff for remote calls
//!
//! Transient failures (timeouts, connect errors, 5xx, rate limits) retry up
//! to the configured bound with a doubling, jittered delay. Permanent
//! failures (4xx, malformed responses) fail immediately — retrying them
//! only burns the remote's goodwill.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Failure classification for a single remote call attempt
#[derive(Debug, Clone)]
pub enum CallError {
    /// Worth retrying: network timeout, connect failure, 5xx, 429
    Transient(String),
    /// Not worth retrying: client error, bad response shape
    Permanent(String),
}

impl CallError {
    pub fn message(&self) -> &str {
        match self {
            CallError::Transient(m) | CallError::Permanent(m) => m,
        }
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Transient(m) => write!(f, "transient: {}", m),
            CallError::Permanent(m) => write!(f, "permanent: {}", m),
        }
    }
}

/// Retry bounds shared by all integration clients
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff; doubles per subsequent attempt
    pub base_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based), with jitter
    fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = self.base_backoff.saturating_mul(1u32 << (attempt - 1).min(16));
        let jitter_ms = if exp.as_millis() > 1 {
            rand::thread_rng().gen_range(0..exp.as_millis() as u64 / 2)
        } else {
            0
        };
        exp + Duration::from_millis(jitter_ms)
    }
}

/// Run `op` until it succeeds, fails permanently, or exhausts the retry bound
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    op_name: &str,
    mut op: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(CallError::Permanent(msg)) => {
                debug!(op = %op_name, error = %msg, "Permanent failure, not retrying");
                return Err(CallError::Permanent(msg));
            }
            Err(CallError::Transient(msg)) => {
                attempt += 1;
                if attempt > config.max_retries {
                    warn!(
                        op = %op_name,
                        attempts = attempt,
                        error = %msg,
                        "Retries exhausted"
                    );
                    return Err(CallError::Transient(msg));
                }
                let backoff = config.backoff_for(attempt);
                debug!(
                    op = %op_name,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %msg,
                    "Transient failure, backing off"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_config(3), "op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CallError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_config(3), "op", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(CallError::Transient("flaky".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_config(2), "op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CallError::Transient("down".into()))
        })
        .await;
        assert!(matches!(result, Err(CallError::Transient(_))));
        // Initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_config(5), "op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CallError::Permanent("bad request".into()))
        })
        .await;
        assert!(matches!(result, Err(CallError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_grows() {
        let config = RetryConfig {
            max_retries: 4,
            base_backoff: Duration::from_millis(100),
        };
        // Jitter adds at most half the exponential base, so attempt 3's
        // floor (400ms) always clears attempt 1's ceiling (150ms)
        assert!(config.backoff_for(3) > config.backoff_for(1));
    }
}
