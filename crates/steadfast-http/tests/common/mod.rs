//! Common test infrastructure for steadfast-http tests
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

pub mod mock_server;

pub use mock_server::*;

use std::time::Duration;

use steadfast_core::retry::{RetryOptions, StatsObserver};
use steadfast_http::HttpError;
use std::sync::Arc;

/// Retry options with millisecond delays so tests stay fast
pub fn quick_options(max_attempts: u32) -> RetryOptions<HttpError> {
    RetryOptions::new()
        .named("test-fetch")
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
}

/// Quick options plus a stats observer to count retries
pub fn observed_options(max_attempts: u32) -> (RetryOptions<HttpError>, Arc<StatsObserver>) {
    let observer = Arc::new(StatsObserver::new());
    let options = quick_options(max_attempts).with_observer(observer.clone());
    (options, observer)
}
