//! Request description reused across attempts

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use crate::error::Result;

/// Everything needed to rebuild the same request for every attempt
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// HTTP method (GET when unset)
    pub method: Method,

    /// Request headers
    pub headers: HeaderMap,

    /// Request body, sent unchanged on every attempt
    pub body: Option<Vec<u8>>,

    /// Per-request timeout, overriding the client's
    pub timeout: Option<Duration>,
}

impl RequestInit {
    /// Create a GET request description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set a raw body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Set a per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a fresh request for one attempt
    pub(crate) fn build(&self, client: &Client, url: &Url) -> RequestBuilder {
        let mut request = client
            .request(self.method.clone(), url.clone())
            .headers(self.headers.clone());

        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request
    }
}
