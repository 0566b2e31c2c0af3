//! Error types for steadfast-http

use reqwest::{Response, StatusCode};
use steadfast_core::retry::{Cancelled, RetryableError};
use thiserror::Error;

/// Result type alias using steadfast-http's error type
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors produced by a retrying HTTP request
///
/// The messages are chosen so the executor's default rule recognises
/// transport failures ("Network request failed") and timeouts ("timeout").
#[derive(Error, Debug)]
pub enum HttpError {
    /// The URL could not be parsed; no request was sent
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The request could not be completed at the transport level
    #[error("Network request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(#[source] reqwest::Error),

    /// A server-error response promoted to an error
    #[error("HTTP error {status}: {status_text}")]
    Status { status: u16, status_text: String },

    /// A rate-limited response, held while retries remain and handed back
    /// to the caller unchanged once they run out
    #[error("HTTP error 429: Too Many Requests")]
    RateLimited(Response),

    /// The request was aborted before completing
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// The request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HttpError {
    /// Create a status error from a response status code
    pub fn from_status(status: StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Classify a transport error from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }

    /// The HTTP status code, for promoted responses
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited(response) => Some(response.status().as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl RetryableError for HttpError {
    fn status(&self) -> Option<u16> {
        self.status_code()
    }

    fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl From<Cancelled> for HttpError {
    fn from(err: Cancelled) -> Self {
        Self::Aborted(err.to_string())
    }
}
