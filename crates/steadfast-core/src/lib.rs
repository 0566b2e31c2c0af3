//! # steadfast-core
//!
//! Core library for Steadfast providing:
//! - A retry executor with exponential backoff and jitter
//! - Pluggable retryability predicates and retry observers
//! - An adapter that turns an async function into a retrying one
//! - Retry policy configuration with file and environment layering

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::RetryConfigLoader;
pub use error::{Error, Result};
pub use retry::{execute, execute_with_cancellation, make_retryable, RetryOptions};
pub use types::{RetryPoliciesConfig, RetryPolicy};
