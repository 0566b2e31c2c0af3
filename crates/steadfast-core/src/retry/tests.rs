//! Integration tests for the retry module
//!
//! These tests drive the executor end to end. Most run on a paused tokio
//! clock so backoff delays complete instantly and elapsed time equals the
//! sum of the delays that were awaited.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::retry::{
    execute, execute_with_cancellation, make_retryable, AlwaysRetry, NeverRetry, OperationError,
    OperationErrorKind, RetryOptions, StatsObserver,
};

/// Options with exact, short delays
fn quick_options(max_attempts: u32) -> RetryOptions<OperationError> {
    RetryOptions::new()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(100))
        .jitter(false)
}

fn transient(attempt: u32) -> OperationError {
    OperationError::with_status(503, format!("failure {}", attempt))
}

// ============================================================================
// Attempt bounds
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_always_failing_operation_runs_max_attempts() {
    for max_attempts in 1..=5 {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = execute(
            || {
                let counter = counter.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(transient(attempt))
                }
            },
            quick_options(max_attempts),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_max_attempts_still_runs_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient(1))
            }
        },
        quick_options(0),
    )
    .await;

    assert_eq!(result.unwrap_err(), transient(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_success_has_no_delay() {
    let start = Instant::now();
    let observer = Arc::new(StatsObserver::new());

    let result = execute(
        || async { Ok::<_, OperationError>("grace") },
        RetryOptions::new().with_observer(observer.clone()),
    )
    .await;

    assert_eq!(result.unwrap(), "grace");
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(observer.retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_success_after_retry_stops_early() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let observer = Arc::new(StatsObserver::new());
    let start = Instant::now();

    let result = execute(
        || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(transient(attempt))
                } else {
                    Ok(attempt)
                }
            }
        },
        RetryOptions::new()
            .max_attempts(5)
            .jitter(false)
            .with_observer(observer.clone()),
    )
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(observer.retries(), 2);

    // Only the two delays before attempts 2 and 3 were awaited: 1000 + 2000
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3010), "{:?}", elapsed);
}

// ============================================================================
// Predicate handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_policy_rejection_short_circuits() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let observer = Arc::new(StatsObserver::new());

    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient(1))
            }
        },
        quick_options(10)
            .with_predicate(NeverRetry)
            .with_observer(observer.clone()),
    )
    .await;

    assert_eq!(result.unwrap_err(), transient(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(observer.retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_predicate_not_consulted_on_final_attempt() {
    let predicate_calls = Arc::new(AtomicU32::new(0));
    let seen = predicate_calls.clone();

    let result: Result<(), _> = execute(
        || async { Err(OperationError::new("bad input")) },
        quick_options(3).should_retry(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(predicate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_caller_predicate_replaces_default() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    // "bad input" is permanent under the default rule, but AlwaysRetry wins
    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(OperationError::new("bad input"))
            }
        },
        quick_options(4).with_predicate(AlwaysRetry),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Error fidelity and observers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_last_error_unwrapped() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(transient(attempt))
            }
        },
        quick_options(4),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err, transient(4));
    assert_eq!(err.message(), "failure 4");
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_each_retry_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(transient(attempt))
            }
        },
        quick_options(4).on_retry(move |attempt, err: &OperationError| {
            record
                .lock()
                .unwrap()
                .push((attempt, err.message().to_string()));
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (1, "failure 1".to_string()),
            (2, "failure 2".to_string()),
            (3, "failure 3".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
#[should_panic(expected = "observer failed")]
async fn test_observer_panic_is_not_swallowed() {
    let _: Result<(), _> = execute(
        || async { Err(transient(1)) },
        quick_options(3).on_retry(|_, _: &OperationError| panic!("observer failed")),
    )
    .await;
}

// ============================================================================
// Delay schedule
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_jittered_delays_stay_in_bounds() {
    for _ in 0..20 {
        let start = Instant::now();

        let result: Result<(), _> = execute(
            || async { Err(transient(1)) },
            RetryOptions::new().max_attempts(3),
        )
        .await;
        assert!(result.is_err());

        // Delays before attempts 2 and 3: [1000, 1300) + [2000, 2600)
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3905), "{:?}", elapsed);
    }
}

#[tokio::test(start_paused = true)]
async fn test_delays_respect_max_delay() {
    let start = Instant::now();

    let result: Result<(), _> = execute(
        || async { Err(transient(1)) },
        RetryOptions::new()
            .max_attempts(5)
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(250))
            .jitter(false),
    )
    .await;
    assert!(result.is_err());

    // 100 + 200 + 250 + 250
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(800), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(815), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_sub_millisecond_delay_still_sleeps() {
    let start = Instant::now();

    let result: Result<(), _> = execute(
        || async { Err(transient(1)) },
        RetryOptions::new()
            .max_attempts(2)
            .initial_delay(Duration::from_micros(500))
            .jitter(false),
    )
    .await;
    assert!(result.is_err());

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_micros(500), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(5), "{:?}", elapsed);
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_server_error_with_default_options() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), _> = execute(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(OperationError::with_status(503, "Service Unavailable"))
            }
        },
        RetryOptions::new(),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(crate::retry::RetryableError::status(&err), Some(503));
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_then_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result = execute(
        || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt == 1 {
                    Err(OperationError::new("bad input"))
                } else {
                    Ok("would succeed")
                }
            }
        },
        RetryOptions::new().max_attempts(3),
    )
    .await;

    assert_eq!(result.unwrap_err(), OperationError::new("bad input"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_make_retryable_forwards_arguments() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    let add = make_retryable(
        move |(a, b): (i32, i32)| {
            let record = record.clone();
            async move {
                let mut calls = record.lock().unwrap();
                calls.push((a, b));
                if calls.len() == 1 {
                    Err(OperationError::new("Network request failed"))
                } else {
                    Ok(a + b)
                }
            }
        },
        quick_options(3),
    );

    assert_eq!(add.call((1, 2)).await.unwrap(), 3);
    assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (1, 2)]);
}

#[tokio::test(start_paused = true)]
async fn test_make_retryable_calls_are_independent() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let echo = make_retryable(
        move |word: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OperationError>(word)
            }
        },
        quick_options(3),
    );
    let cloned = echo.clone();

    assert_eq!(echo.call("amen".to_string()).await.unwrap(), "amen");
    assert_eq!(cloned.call("selah".to_string()).await.unwrap(), "selah");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(echo.options().resolve_policy().max_attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_io_errors_use_message_rule() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), io::Error> = execute(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout"))
            }
        },
        RetryOptions::new().max_attempts(2).jitter(false),
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "read timeout");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_are_independent() {
    let first = Arc::new(AtomicU32::new(0));
    let second = Arc::new(AtomicU32::new(0));
    let (a, b) = (first.clone(), second.clone());

    let (left, right) = tokio::join!(
        execute(
            || {
                let a = a.clone();
                async move {
                    a.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(transient(1))
                }
            },
            quick_options(2),
        ),
        execute(
            || {
                let b = b.clone();
                async move {
                    b.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(transient(1))
                }
            },
            quick_options(4),
        ),
    );

    assert!(left.is_err() && right.is_err());
    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(second.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_first_attempt() {
    let token = CancellationToken::new();
    token.cancel();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), _> = execute_with_cancellation(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
        quick_options(3),
        &token,
    )
    .await;

    assert_eq!(result.unwrap_err().kind(), OperationErrorKind::Aborted);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_backoff() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let start = Instant::now();

    let result: Result<(), _> = execute_with_cancellation(
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient(1))
            }
        },
        RetryOptions::new()
            .max_attempts(5)
            .on_retry(move |_, _: &OperationError| trigger.cancel()),
        &token,
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), OperationErrorKind::Aborted);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_uncancelled_token_behaves_like_execute() {
    let token = CancellationToken::new();

    let result = execute_with_cancellation(
        || async { Ok::<_, OperationError>(7) },
        quick_options(3),
        &token,
    )
    .await;

    assert_eq!(result.unwrap(), 7);
}
