//! Retrying HTTP requests

use reqwest::{Client, Response, StatusCode};
use steadfast_core::retry::{execute, RetryOptions};
use tracing::debug;
use url::Url;

use crate::error::{HttpError, Result};
use crate::predicate::HttpRetryPredicate;
use crate::request::RequestInit;

/// Send a request, retrying rate-limit and server-error responses
///
/// Each attempt rebuilds the request from `init` (GET with no body when
/// `None`). Responses with status >= 500 become [`HttpError::Status`].
/// A 429 is retried like a server error, but if it outlasts every attempt
/// the last 429 response is returned as-is, as are all other responses
/// below 500. Transport failures and timeouts surface as
/// [`HttpError::Network`] and [`HttpError::Timeout`].
///
/// Any `should_retry` predicate in `options` is consulted only for errors
/// that are not retryable statuses.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    init: Option<RequestInit>,
    options: RetryOptions<HttpError>,
) -> Result<Response> {
    let url = Url::parse(url).map_err(|source| HttpError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let init = init.unwrap_or_default();

    let fallback = options.predicate();
    let options = options.with_predicate(HttpRetryPredicate::new(fallback));

    match execute(|| send_once(client, &url, &init), options).await {
        Err(HttpError::RateLimited(response)) => Ok(response),
        result => result,
    }
}

/// Send a GET request with retries
pub async fn fetch_url_with_retry(
    client: &Client,
    url: &str,
    options: RetryOptions<HttpError>,
) -> Result<Response> {
    fetch_with_retry(client, url, None, options).await
}

async fn send_once(client: &Client, url: &Url, init: &RequestInit) -> Result<Response> {
    let response = init
        .build(client, url)
        .send()
        .await
        .map_err(HttpError::from_transport)?;

    promote_response(response)
}

/// Turn a rate-limited or server-error response into a retryable error
///
/// A 429 keeps its response in [`HttpError::RateLimited`] so it can be
/// returned once retries are exhausted.
pub fn promote_response(response: Response) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        debug!(url = %response.url(), "rate limited");
        return Err(HttpError::RateLimited(response));
    }

    if status.as_u16() >= 500 {
        debug!(
            status = status.as_u16(),
            url = %response.url(),
            "promoting response to error"
        );
        return Err(HttpError::from_status(status));
    }

    Ok(response)
}
