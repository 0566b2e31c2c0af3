//! Per-call retry options
//!
//! `RetryOptions` is a partial override of the default `RetryPolicy` plus
//! the two behavioural hooks: the retry predicate and the retry observer.
//! Unset fields fall back to the defaults independently of one another.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::types::RetryPolicy;

use super::observer::{ClosureObserver, RetryObserver};
use super::strategies::{ClosurePredicate, RetryPredicate};

/// Operation label used in log events when none is set
pub const DEFAULT_OPERATION_NAME: &str = "retry";

/// Options for a single retrying call
///
/// # Example
///
/// ```rust
/// use steadfast_core::retry::{OperationError, RetryOptions};
/// use std::time::Duration;
///
/// let options = RetryOptions::<OperationError>::new()
///     .named("daily-verse")
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200))
///     .on_retry(|attempt, err: &OperationError| eprintln!("retry {}: {}", attempt, err));
///
/// let policy = options.resolve_policy();
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.max_delay_ms, 10000);
/// ```
pub struct RetryOptions<E> {
    operation: Option<String>,
    max_attempts: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    backoff_multiplier: Option<f64>,
    jitter: bool,
    should_retry: Option<Arc<dyn RetryPredicate<E>>>,
    on_retry: Option<Arc<dyn RetryObserver<E>>>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            should_retry: self.should_retry.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("operation", &self.operation)
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("should_retry", &self.should_retry.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl<E> RetryOptions<E> {
    /// Create options with nothing overridden
    pub fn new() -> Self {
        Self {
            operation: None,
            max_attempts: None,
            initial_delay: None,
            max_delay: None,
            backoff_multiplier: None,
            jitter: true,
            should_retry: None,
            on_retry: None,
        }
    }

    /// Create options that override every numeric field from a policy
    pub fn from_policy(policy: &RetryPolicy) -> Self {
        Self::new()
            .max_attempts(policy.max_attempts)
            .initial_delay(policy.initial_delay())
            .max_delay(policy.max_delay())
            .backoff_multiplier(policy.backoff_multiplier)
    }

    /// Label the operation in log events
    pub fn named(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Maximum number of attempts, including the first
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before the first retry
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Cap for the un-jittered delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Factor applied to the delay after each failure
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Enable or disable jitter (enabled by default)
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Decide retryability with a closure
    pub fn should_retry<F>(self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.with_predicate(ClosurePredicate::new(predicate))
    }

    /// Decide retryability with a predicate
    pub fn with_predicate<P>(self, predicate: P) -> Self
    where
        P: RetryPredicate<E> + 'static,
    {
        self.with_shared_predicate(Arc::new(predicate))
    }

    /// Decide retryability with an already shared predicate
    pub fn with_shared_predicate(mut self, predicate: Arc<dyn RetryPredicate<E>>) -> Self {
        self.should_retry = Some(predicate);
        self
    }

    /// Observe retries with a closure
    pub fn on_retry<F>(self, observer: F) -> Self
    where
        F: Fn(u32, &E) + Send + Sync + 'static,
    {
        self.with_observer(ClosureObserver::new(observer))
    }

    /// Observe retries with an observer
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver<E> + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// The caller-supplied predicate, if any
    pub fn predicate(&self) -> Option<Arc<dyn RetryPredicate<E>>> {
        self.should_retry.clone()
    }

    /// The caller-supplied observer, if any
    pub fn observer(&self) -> Option<&Arc<dyn RetryObserver<E>>> {
        self.on_retry.as_ref()
    }

    /// Operation label used in log events
    pub fn operation_name(&self) -> &str {
        self.operation.as_deref().unwrap_or(DEFAULT_OPERATION_NAME)
    }

    /// Whether jitter is applied to delays
    pub fn jitter_enabled(&self) -> bool {
        self.jitter
    }

    /// Merge the overrides over `RetryPolicy::default()`
    ///
    /// The policy stores delays in whole milliseconds; use
    /// [`RetryOptions::resolve_delays`] for the exact durations.
    pub fn resolve_policy(&self) -> RetryPolicy {
        self.resolve_over(&RetryPolicy::default())
    }

    /// Merge the overrides over a base policy, field by field
    pub fn resolve_over(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay_ms: self
                .initial_delay
                .map(duration_ms)
                .unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay.map(duration_ms).unwrap_or(base.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
        }
    }

    /// Initial and maximum delay over the defaults, without rounding
    pub fn resolve_delays(&self) -> (Duration, Duration) {
        let base = RetryPolicy::default();
        (
            self.initial_delay.unwrap_or_else(|| base.initial_delay()),
            self.max_delay.unwrap_or_else(|| base.max_delay()),
        )
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
