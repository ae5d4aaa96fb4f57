//! Resilient call executor.
//!
//! Wraps a single outbound operation in a bounded retry policy with linear
//! backoff.  Every failure is run through the policy's classifier:
//!
//! - non-retryable errors surface immediately, whatever attempts remain;
//! - retryable errors are retried after `base_delay * attempt`;
//! - once `max_attempts` is reached the *last* error is returned as-is.
//!
//! The backoff wait is a `tokio::time::sleep`, so a run waiting to retry
//! does not hold a worker thread.
//!
//! # Example
//!
//! ```rust
//! # use std::time::Duration;
//! # use taskweave_kernel::{CallError, RetryPolicy, execute};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = RetryPolicy::new(3, Duration::from_millis(1));
//! let result: Result<u32, CallError> =
//!     execute(&policy, "lookup", || async { Ok(42) }).await;
//! assert_eq!(result.unwrap(), 42);
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::CallError;

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; attempt `n` waits `n` times this before retrying.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Decides whether a failed attempt is worth retrying.
pub type RetryClassifier = Arc<dyn Fn(&CallError) -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Standard classification: server errors, timeouts and transport failures
/// are transient; every 4xx and unreadable responses are fatal.
pub fn default_retryable(err: &CallError) -> bool {
    match err {
        CallError::Http { status, .. } => *status >= 500,
        CallError::Timeout { .. } | CallError::Transport { .. } => true,
        CallError::InvalidResponse { .. } => false,
    }
}

/// Like [`default_retryable`], but additionally treats the given status
/// codes (typically `429` rate limiting or `408` request timeout) as
/// transient.
pub fn retryable_with_statuses(statuses: &[u16]) -> RetryClassifier {
    let statuses = statuses.to_vec();
    Arc::new(move |err: &CallError| match err.status() {
        Some(status) if statuses.contains(&status) => true,
        _ => default_retryable(err),
    })
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Retry policy for one call site.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one (always at least 1).
    max_attempts: u32,
    /// Backoff unit; the wait after attempt `n` is `base_delay * n`.
    base_delay: Duration,
    /// Optional limit on a single attempt.  An attempt exceeding it fails
    /// with [`CallError::Timeout`].
    attempt_timeout: Option<Duration>,
    classifier: RetryClassifier,
}

impl RetryPolicy {
    /// Create a policy with the default classifier.  `max_attempts` is
    /// clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            attempt_timeout: None,
            classifier: Arc::new(default_retryable),
        }
    }

    /// Builder: replace the retryability classifier.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&CallError) -> bool + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Builder: install an already shared classifier.
    pub fn with_shared_classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Builder: bound each individual attempt.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Wait applied after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether `err` should be retried under this policy.
    pub fn is_retryable(&self, err: &CallError) -> bool {
        (self.classifier)(err)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Run `operation` under `policy`.
///
/// `operation` is invoked once per attempt and must perform exactly one
/// logical outbound call.  `operation_name` only labels log lines.
pub async fn execute<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let max_attempts = policy.max_attempts;
    let mut attempt: u32 = 1;

    loop {
        debug!(
            operation = operation_name,
            attempt,
            max_attempts,
            "call attempt"
        );

        let result = match policy.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(result) => result,
                Err(_elapsed) => Err(CallError::timeout(format!(
                    "{operation_name} exceeded {}ms",
                    limit.as_millis()
                ))),
            },
            None => operation().await,
        };

        let err = match result {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !policy.is_retryable(&err) {
            error!(
                operation = operation_name,
                attempt,
                error = %err,
                "non-retryable error on attempt {attempt}, aborting"
            );
            return Err(err);
        }

        if attempt >= max_attempts {
            error!(
                operation = operation_name,
                error = %err,
                "failed after {attempt} attempts"
            );
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            operation = operation_name,
            attempt,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "attempt {attempt} failed, waiting {}ms before retry",
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
