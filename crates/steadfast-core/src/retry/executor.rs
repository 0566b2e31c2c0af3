//! Retry execution engine
//!
//! The executor is a pair of free functions. Each call owns its attempt
//! counter and timer; nothing is shared between calls.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{Cancelled, RetryableError};
use super::options::RetryOptions;
use super::strategies::{exponential_delay, is_retryable_by_default, with_jitter};

/// Execute an async operation with retry logic
///
/// The operation is invoked at most `max_attempts` times. A success is
/// returned immediately. A failure is retried when the predicate (or the
/// default rule when none is set) accepts it, after an exponential backoff
/// delay with jitter. The final attempt's error is returned as-is, and so is
/// an error the predicate rejects.
///
/// # Example
///
/// ```rust,no_run
/// use steadfast_core::retry::{execute, OperationError, RetryOptions};
///
/// async fn example() -> Result<String, OperationError> {
///     execute(
///         || async {
///             // Your fallible operation here
///             Ok("In the beginning".to_string())
///         },
///         RetryOptions::new().named("daily-verse"),
///     )
///     .await
/// }
/// ```
pub async fn execute<F, Fut, T, E>(operation: F, options: RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    run(operation, options, None).await
}

/// Execute an async operation with retry logic, honouring a cancellation token
///
/// The token is checked before every attempt and raced against every
/// backoff delay. Once it fires the call fails with `E::from(Cancelled)`
/// without consulting the retry predicate. An attempt already in flight is
/// allowed to finish.
pub async fn execute_with_cancellation<F, Fut, T, E>(
    operation: F,
    options: RetryOptions<E>,
    token: &CancellationToken,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + From<Cancelled>,
{
    let cancellation = Cancellation {
        token,
        error: cancelled_error::<E>,
    };
    run(operation, options, Some(cancellation)).await
}

struct Cancellation<'a, E> {
    token: &'a CancellationToken,
    error: fn() -> E,
}

fn cancelled_error<E: From<Cancelled>>() -> E {
    E::from(Cancelled)
}

async fn run<F, Fut, T, E>(
    mut operation: F,
    options: RetryOptions<E>,
    cancellation: Option<Cancellation<'_, E>>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let policy = options.resolve_policy();
    let (initial_delay, max_delay) = options.resolve_delays();
    let name = options.operation_name();
    let predicate = options.predicate();
    let observer = options.observer();

    let max_attempts = if policy.max_attempts == 0 {
        warn!(operation = %name, "max_attempts is 0, making a single attempt");
        1
    } else {
        policy.max_attempts
    };

    let start = Instant::now();
    let mut attempt = 1;

    loop {
        if let Some(cancel) = &cancellation {
            if cancel.token.is_cancelled() {
                debug!(operation = %name, attempt = attempt, "retry cancelled before attempt");
                return Err((cancel.error)());
            }
        }

        debug!(
            operation = %name,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );

        let err = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        operation = %name,
                        attempt = attempt,
                        total_duration_ms = start.elapsed().as_millis() as u64,
                        "succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        if attempt >= max_attempts {
            error!(
                operation = %name,
                attempts = attempt,
                error = %err,
                "all retry attempts exhausted"
            );
            return Err(err);
        }

        let retryable = match &predicate {
            Some(predicate) => predicate.should_retry(&err),
            None => is_retryable_by_default(&err),
        };
        if !retryable {
            debug!(
                operation = %name,
                attempt = attempt,
                error = %err,
                "error is not retryable, giving up"
            );
            return Err(err);
        }

        let delay = with_jitter(
            exponential_delay(initial_delay, max_delay, policy.backoff_multiplier, attempt),
            options.jitter_enabled(),
        );

        warn!(
            operation = %name,
            attempt = attempt,
            max_attempts = max_attempts,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );

        if let Some(observer) = observer {
            observer.on_retry(attempt, &err);
        }
        drop(err);

        match &cancellation {
            Some(cancel) => {
                tokio::select! {
                    _ = cancel.token.cancelled() => {
                        debug!(operation = %name, attempt = attempt, "retry cancelled during backoff");
                        return Err((cancel.error)());
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        attempt += 1;
    }
}
