//! Retry observation
//!
//! A `RetryObserver` is told about every retry right before the executor
//! waits out the backoff delay. Observers are side channels: their return
//! value is ignored and they cannot change the outcome of the call.
//!
//! Observers are infallible by signature. A panicking observer is not
//! caught; it unwinds through the retrying future like any other panic.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Observer trait for retry events
///
/// # Example
///
/// ```rust
/// use steadfast_core::retry::RetryObserver;
/// use std::io;
///
/// struct RetryCounter;
///
/// impl RetryObserver<io::Error> for RetryCounter {
///     fn on_retry(&self, attempt: u32, error: &io::Error) {
///         eprintln!("attempt {} failed: {}", attempt, error);
///     }
/// }
/// ```
pub trait RetryObserver<E: ?Sized>: Send + Sync {
    /// Called once per retry, after attempt `attempt` (1-indexed) failed
    /// with `error` and before the delay preceding the next attempt
    fn on_retry(&self, attempt: u32, error: &E);
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl<E: ?Sized> RetryObserver<E> for NoOpObserver {
    fn on_retry(&self, _attempt: u32, _error: &E) {}
}

/// An observer that forwards to a closure
pub struct ClosureObserver<F> {
    observer: F,
}

impl<F> ClosureObserver<F> {
    /// Create a new closure-based observer
    pub fn new(observer: F) -> Self {
        Self { observer }
    }
}

impl<E, F> RetryObserver<E> for ClosureObserver<F>
where
    F: Fn(u32, &E) + Send + Sync,
{
    fn on_retry(&self, attempt: u32, error: &E) {
        (self.observer)(attempt, error)
    }
}

/// An observer that counts retries
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    retries: AtomicU32,
    last_attempt: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retries observed
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Attempt number reported by the most recent retry (0 if none)
    pub fn last_attempt(&self) -> u32 {
        self.last_attempt.load(Ordering::SeqCst)
    }
}

impl<E: ?Sized> RetryObserver<E> for StatsObserver {
    fn on_retry(&self, attempt: u32, _error: &E) {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.last_attempt.store(attempt, Ordering::SeqCst);
    }
}

impl<E: ?Sized, T: RetryObserver<E> + ?Sized> RetryObserver<E> for Arc<T> {
    fn on_retry(&self, attempt: u32, error: &E) {
        (**self).on_retry(attempt, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[test]
    fn test_noop_observer() {
        let error = io::Error::other("test");
        RetryObserver::<io::Error>::on_retry(&NoOpObserver, 1, &error);
    }

    #[test]
    fn test_stats_observer() {
        let observer = StatsObserver::new();
        let error = io::Error::other("test");

        observer.on_retry(1, &error);
        observer.on_retry(2, &error);

        assert_eq!(observer.retries(), 2);
        assert_eq!(observer.last_attempt(), 2);
    }

    #[test]
    fn test_closure_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = ClosureObserver::new(|attempt: u32, error: &io::Error| {
            seen.lock().unwrap().push((attempt, error.to_string()));
        });

        observer.on_retry(1, &io::Error::other("first"));

        assert_eq!(*seen.lock().unwrap(), vec![(1, "first".to_string())]);
    }

    #[test]
    fn test_arc_observer() {
        let observer = Arc::new(StatsObserver::new());
        let error = io::Error::other("test");

        observer.on_retry(1, &error);

        assert_eq!(observer.retries(), 1);
    }
}
