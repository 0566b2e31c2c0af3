//! HTTP-aware retry predicate

use std::sync::Arc;

use steadfast_core::retry::{
    is_retryable_by_default, RetryPredicate, RetryableError, SERVER_ERROR_STATUS,
};

use crate::error::HttpError;

/// Status code for rate-limited responses
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Retries rate-limit and server-error statuses, deferring everything else
///
/// Errors with status 429 or a status in `[500, 600)` are always retried.
/// Any other error goes to the fallback predicate when one is set, or to
/// the executor's default rule otherwise.
#[derive(Clone, Default)]
pub struct HttpRetryPredicate {
    fallback: Option<Arc<dyn RetryPredicate<HttpError>>>,
}

impl HttpRetryPredicate {
    /// Create a predicate with an optional fallback for non-status errors
    pub fn new(fallback: Option<Arc<dyn RetryPredicate<HttpError>>>) -> Self {
        Self { fallback }
    }

    /// Whether a status code alone makes a response worth retrying
    pub fn is_retryable_status(status: u16) -> bool {
        status == TOO_MANY_REQUESTS || SERVER_ERROR_STATUS.contains(&status)
    }
}

impl RetryPredicate<HttpError> for HttpRetryPredicate {
    fn should_retry(&self, error: &HttpError) -> bool {
        if error.status().is_some_and(Self::is_retryable_status) {
            return true;
        }

        match &self.fallback {
            Some(predicate) => predicate.should_retry(error),
            None => is_retryable_by_default(error),
        }
    }
}
