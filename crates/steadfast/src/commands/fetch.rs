//! Fetch command

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use steadfast_core::RetryOptions;
use steadfast_http::{fetch_with_retry, HttpError, RequestInit};
use tracing::debug;

use crate::cli::FetchArgs;
use crate::output;

pub async fn run(args: FetchArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let policy = super::resolve_policy(config_path, &args.policy)?;
    debug!(operation = %args.policy.operation, ?policy, "resolved retry policy");
    let init = build_request(&args)?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("steadfast/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let spinner = (!args.json).then(|| output::spinner(&format!("Fetching {}", args.url)));
    let retries = Arc::new(AtomicU32::new(0));

    let options = {
        let retries = retries.clone();
        let spinner = spinner.clone();
        RetryOptions::from_policy(&policy)
            .named(args.policy.operation.clone())
            .on_retry(move |attempt, err: &HttpError| {
                retries.fetch_add(1, Ordering::SeqCst);
                if let Some(pb) = &spinner {
                    pb.set_message(format!("Attempt {} failed ({}), retrying", attempt, err));
                }
            })
    };

    let result = fetch_with_retry(&client, &args.url, Some(init), options).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let attempts = retries.load(Ordering::SeqCst) + 1;
    let response = result.with_context(|| {
        format!(
            "Request to {} failed after {} attempt(s)",
            args.url, attempts
        )
    })?;

    let status = response.status();
    debug!(url = %args.url, status = status.as_u16(), attempts, "fetch complete");
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if args.json {
        let summary = serde_json::json!({
            "url": args.url,
            "status": status.as_u16(),
            "attempts": attempts,
            "body": body,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if status.is_success() {
        output::success(&format!("{} {}", status, args.url));
    } else {
        output::warning(&format!("{} {}", status, args.url));
    }
    output::kv("attempts", &attempts.to_string());
    println!("{}", body);

    Ok(())
}

fn build_request(args: &FetchArgs) -> Result<RequestInit> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .map_err(|_| anyhow!("Invalid HTTP method: {}", args.method))?;

    let mut init = RequestInit::new().method(method);

    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        init = init.header(name, value);
    }

    if let Some(data) = &args.data {
        init = init.body(data.as_bytes());
    }

    if let Some(secs) = args.timeout_secs {
        init = init.timeout(Duration::from_secs(secs));
    }

    Ok(init)
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Header must look like 'Name: value', got '{}'", raw))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("Invalid header name in '{}'", raw))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("Invalid header value in '{}'", raw))?;

    Ok((name, value))
}
