//! Retry execution with exponential backoff and jitter
//!
//! # Features
//!
//! - Exponential backoff capped at a maximum delay, with up to 30% jitter
//! - Pluggable retryability via the `RetryPredicate` trait or a closure
//! - Observable retries via the `RetryObserver` trait or a closure
//! - Errors are returned unwrapped: the caller sees exactly what the
//!   operation produced
//! - Optional cancellation through `tokio_util`'s `CancellationToken`
//! - `make_retryable` to give an existing async function retry behaviour
//!
//! # Example
//!
//! ```rust,no_run
//! use steadfast_core::retry::{execute, OperationError, RetryOptions};
//!
//! async fn example() -> Result<String, OperationError> {
//!     execute(
//!         || async { Err(OperationError::with_status(503, "Service Unavailable")) },
//!         RetryOptions::new().max_attempts(3),
//!     )
//!     .await
//! }
//! ```

mod adapter;
mod error;
mod executor;
mod observer;
mod options;
mod strategies;

pub use adapter::{make_retryable, Retryable};
pub use error::{Cancelled, OperationError, OperationErrorKind, RetryableError};
pub use executor::{execute, execute_with_cancellation};
pub use observer::{ClosureObserver, NoOpObserver, RetryObserver, StatsObserver};
pub use options::{RetryOptions, DEFAULT_OPERATION_NAME};
pub use strategies::{
    backoff_delay, calculate_delay, exponential_delay, is_retryable_by_default, with_jitter,
    AlwaysRetry, ClosurePredicate, DefaultRetryPredicate, MessagePredicate, NeverRetry,
    RetryPredicate, JITTER_FACTOR, SERVER_ERROR_STATUS,
};

#[cfg(test)]
mod tests;
