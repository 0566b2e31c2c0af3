//! # steadfast-http
//!
//! HTTP requests with automatic retry, built on the steadfast-core executor:
//! - Rate-limited (429) and server-error (5xx) responses are retried
//! - Transport failures and timeouts are retried by the default rule
//! - Other responses, including 4xx, are returned to the caller untouched
//!
//! # Example
//!
//! ```no_run
//! use steadfast_core::RetryOptions;
//! use steadfast_http::fetch_url_with_retry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), steadfast_http::HttpError> {
//!     let client = reqwest::Client::new();
//!     let response = fetch_url_with_retry(
//!         &client,
//!         "https://example.com/verse-of-the-day",
//!         RetryOptions::new().named("verse-of-the-day"),
//!     )
//!     .await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fetch;
pub mod predicate;
pub mod request;

pub use error::{HttpError, Result};
pub use fetch::{fetch_url_with_retry, fetch_with_retry, promote_response};
pub use predicate::HttpRetryPredicate;
pub use request::RequestInit;
