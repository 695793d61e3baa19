//! Optimistic-concurrency retry loop.
//!
//! Version conflicts are expected under contention (several users joining
//! the last slot of a match at once). Each attempt re-reads current state,
//! so a retry is a fresh decision, not a blind re-submit.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Backoff before the next attempt: base * 2^(attempt-1) plus up to
    /// one base of jitter so colliding writers spread out.
    fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter = rand::thread_rng().gen_range(Duration::ZERO..=self.base_delay);
        backoff + jitter
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error,
/// or `policy.max_attempts` version conflicts have been consumed.
///
/// Exhaustion is reported as [`ServiceError::Conflict`]; the raw
/// `VersionConflict` never escapes this function.
pub async fn with_version_retry<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    tracing::warn!(attempts = attempt, "version retries exhausted");
                    return Err(ServiceError::Conflict);
                }
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "version conflict, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use domain::error::DomainError;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = with_version_retry(policy(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ServiceError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_version_conflict_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = with_version_retry(policy(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ServiceError::VersionConflict)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_becomes_conflict() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = with_version_retry(policy(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::VersionConflict)
            }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Conflict)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_domain_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = with_version_retry(policy(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::Domain(DomainError::AlreadyJoined))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::AlreadyJoined))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_conflict_resolves_to_domain_error_on_reread() {
        // A host rejecting while another request approves loses the
        // versioned write; the retried attempt re-reads the row and must
        // report the state error, not a conflict.
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = with_version_retry(policy(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ServiceError::VersionConflict)
                } else {
                    Err(ServiceError::Domain(
                        DomainError::InvalidParticipationTransition {
                            from: domain::models::ParticipationStatus::Confirmed,
                            action: "reject",
                        },
                    ))
                }
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(
                DomainError::InvalidParticipationTransition { .. }
            ))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_grows_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        };
        // Jitter adds at most one base delay on top of the exponential term.
        let first = policy.delay_for(1);
        let second = policy.delay_for(2);
        assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));
        assert!(second >= Duration::from_millis(100) && second <= Duration::from_millis(150));
    }
}
