//! Conflict retry policy
//!
//! Read-modify-write cycles against the resource store are retried when the
//! store reports a conflicting write. Every other outcome, success or error,
//! ends the loop immediately.

use crate::config::RetryConfig;
use crate::error::Result;
use backoff::backoff::{Backoff, Constant};
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How long to wait between attempts
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Retry straight away
    Immediate,
    /// Fixed delay between attempts
    Constant(Duration),
    /// Growing delay with jitter
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
        randomization_factor: f64,
    },
}

impl BackoffStrategy {
    fn build(&self) -> Box<dyn Backoff + Send> {
        match self {
            BackoffStrategy::Immediate => Box::new(Constant::new(Duration::ZERO)),
            BackoffStrategy::Constant(delay) => Box::new(Constant::new(*delay)),
            BackoffStrategy::Exponential {
                initial,
                max,
                multiplier,
                randomization_factor,
            } => Box::new(
                ExponentialBackoffBuilder::new()
                    .with_initial_interval(*initial)
                    .with_max_interval(*max)
                    .with_multiplier(*multiplier)
                    .with_randomization_factor(*randomization_factor)
                    .with_max_elapsed_time(None)
                    .build(),
            ),
        }
    }
}

/// Bounded retry on conflict
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: BackoffStrategy::Exponential {
                initial: config.initial_interval(),
                max: config.max_interval(),
                multiplier: config.multiplier,
                randomization_factor: config.randomization_factor,
            },
        }
    }
}

impl RetryPolicy {
    /// Retry up to `max_attempts` times without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Immediate,
        }
    }

    /// Run `op` until it returns something other than a conflict, or the
    /// attempts run out. The last result is returned either way.
    pub async fn retry_on_conflict<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.backoff.build();
        let mut attempt = 1;

        loop {
            match op().await {
                Err(err) if err.is_conflict() && attempt < self.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(Duration::ZERO);
                    debug!(
                        "Conflict on attempt {}/{}, retrying in {:?}: {}",
                        attempt, self.max_attempts, delay, err
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_conflicts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let result = policy
            .retry_on_conflict(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err(Error::conflict("CephBlockPool", "p"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_surfaces_last_conflict_when_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<()> = policy
            .retry_on_conflict(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::conflict("CephBlockPool", "p"))
            })
            .await;

        assert_matches!(result, Err(Error::Conflict { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let result: Result<()> = policy
            .retry_on_conflict(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::validation("class mismatch"))
            })
            .await;

        assert_matches!(result, Err(Error::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_constant_backoff_waits() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: BackoffStrategy::Constant(Duration::from_millis(5)),
        };
        let started = std::time::Instant::now();

        let result = policy
            .retry_on_conflict(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::conflict("CephBlockPool", "p"))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_matches!(
            policy.backoff,
            BackoffStrategy::Exponential { initial, .. } if initial == Duration::from_millis(10)
        );
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }
}
