//! Error classification for the retry executor
//!
//! The executor never wraps the errors it sees. It only inspects them
//! through the `RetryableError` trait: the rendered message, an optional
//! numeric status, and whether the error represents an abort.

use std::fmt;
use std::io;

use thiserror::Error;

/// Inspection surface the default retry predicate relies on
///
/// Only `Display` is required; `status` and `is_abort` default to "absent".
pub trait RetryableError: fmt::Display {
    /// Numeric status carried by the error, if any (e.g. an HTTP status)
    fn status(&self) -> Option<u16> {
        None
    }

    /// Whether the error identifies an abort or cancellation
    fn is_abort(&self) -> bool {
        false
    }
}

impl RetryableError for io::Error {
    fn is_abort(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
        )
    }
}

impl RetryableError for Box<dyn std::error::Error + Send + Sync> {}

impl RetryableError for String {}

/// Returned by the cancellable executor when its token fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Kind of an `OperationError`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationErrorKind {
    /// Ordinary failure
    #[default]
    Failed,
    /// The operation was aborted or cancelled
    Aborted,
}

/// A general-purpose operation error carrying a message, an optional status
/// and a kind
///
/// Useful for callers whose operations don't already have a typed error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    status: Option<u16>,
    kind: OperationErrorKind,
}

impl OperationError {
    /// Create a failure with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            kind: OperationErrorKind::Failed,
        }
    }

    /// Create a failure carrying a numeric status
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    /// Create an abort/cancellation failure
    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            kind: OperationErrorKind::Aborted,
            ..Self::new(message)
        }
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error kind
    pub fn kind(&self) -> OperationErrorKind {
        self.kind
    }
}

impl RetryableError for OperationError {
    fn status(&self) -> Option<u16> {
        self.status
    }

    fn is_abort(&self) -> bool {
        self.kind == OperationErrorKind::Aborted
    }
}

impl From<Cancelled> for OperationError {
    fn from(err: Cancelled) -> Self {
        Self::aborted(err.to_string())
    }
}
