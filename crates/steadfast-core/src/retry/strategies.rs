//! Retry delay calculation and predicates
//!
//! Delays follow exponential backoff capped at the policy's maximum, with an
//! optional jitter of up to 30% added on top. Predicates decide whether a
//! failed attempt is worth another try.

use crate::types::RetryPolicy;
use rand::Rng;
use std::fmt;
use std::time::Duration;

use super::error::RetryableError;

/// Upper bound (exclusive) of the jitter, as a fraction of the base delay
pub const JITTER_FACTOR: f64 = 0.3;

/// Range of status codes treated as server errors
pub const SERVER_ERROR_STATUS: std::ops::Range<u16> = 500..600;

/// Calculate the un-jittered backoff delay after a failed attempt
///
/// `attempt` is the 1-indexed attempt that just failed, so the delay before
/// attempt `n + 1` is `min(initial_delay * multiplier^(n-1), max_delay)`.
///
/// # Example
///
/// ```rust
/// use steadfast_core::retry::backoff_delay;
/// use steadfast_core::types::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
///
/// assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(1000));
/// assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(2000));
/// assert_eq!(backoff_delay(&policy, 5), Duration::from_millis(10000));
/// ```
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    exponential_delay(
        policy.initial_delay(),
        policy.max_delay(),
        policy.backoff_multiplier,
        attempt,
    )
}

/// Exponential backoff over raw durations, kept at nanosecond precision
///
/// Returns `min(initial * multiplier^(attempt-1), max)`. A non-finite
/// product is capped at `max`.
pub fn exponential_delay(
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let scaled_ns = initial.as_nanos() as f64 * multiplier.powf(exponent as f64);

    if !scaled_ns.is_finite() || scaled_ns >= max.as_nanos() as f64 {
        return max;
    }
    if scaled_ns <= 0.0 {
        return Duration::ZERO;
    }

    Duration::from_nanos(scaled_ns.round() as u64)
}

/// Calculate the delay before the next retry attempt
///
/// With `jitter` enabled the result lies in `[base, base * 1.3)` where
/// `base` is [`backoff_delay`]. Jitter is drawn freshly on every call.
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    with_jitter(backoff_delay(policy, attempt), jitter)
}

/// Add up to 30% of `base` on top of it when `jitter` is set
pub fn with_jitter(base: Duration, jitter: bool) -> Duration {
    if jitter && !base.is_zero() {
        let factor = rand::rng().random_range(0.0..JITTER_FACTOR);
        base + base.mul_f64(factor)
    } else {
        base
    }
}

/// Default retryability rule
///
/// An error is retryable when its message mentions a failed network
/// request or a timeout, when it carries a 5xx status, or when it is an
/// abort. Everything else is treated as permanent.
pub fn is_retryable_by_default<E: RetryableError + ?Sized>(error: &E) -> bool {
    let message = error.to_string();

    message.contains("Network request failed")
        || message.contains("timeout")
        || error
            .status()
            .is_some_and(|status| SERVER_ERROR_STATUS.contains(&status))
        || error.is_abort()
}

/// A predicate that determines whether an error should be retried
///
/// # Example
///
/// ```rust
/// use steadfast_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error) -> bool {
///         !matches!(
///             error.kind(),
///             ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput
///         )
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E) -> bool;
}

/// The predicate used when the caller supplies none
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPredicate;

impl<E: RetryableError + ?Sized> RetryPredicate<E> for DefaultRetryPredicate {
    fn should_retry(&self, error: &E) -> bool {
        is_retryable_by_default(error)
    }
}

/// A predicate that always returns true (all errors are retryable)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// A predicate that never retries (no errors are retryable)
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E) -> bool {
        false
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

/// A predicate that retries only on specific error messages
///
/// Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct MessagePredicate {
    /// Patterns that indicate retryable errors
    retryable_patterns: Vec<String>,
}

impl MessagePredicate {
    /// Create a new message predicate with the given patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retryable_patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Create a predicate for common network errors
    pub fn network_errors() -> Self {
        Self::new([
            "network request failed",
            "timeout",
            "timed out",
            "connection reset",
            "connection refused",
            "network unreachable",
            "temporary failure",
        ])
    }
}

impl<E: fmt::Display + ?Sized> RetryPredicate<E> for MessagePredicate {
    fn should_retry(&self, error: &E) -> bool {
        let error_msg = error.to_string().to_lowercase();
        self.retryable_patterns
            .iter()
            .any(|pattern| error_msg.contains(pattern))
    }
}
