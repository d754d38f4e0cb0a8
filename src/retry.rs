//! Retry logic for registry and GitHub requests with error classification.

use anyhow::{Result, anyhow};
use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of retry attempts for network operations.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Errors that should not be retried.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later or set GITHUB_TOKEN environment variable.")]
    RateLimitExceeded(String),

    #[error("Authentication failed: {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}. You may need authentication.")]
    Forbidden(String),

    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc. are retryable
        return Ok(());
    };
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "unknown URL".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN => {
            let msg = error.to_string();
            if msg.contains("rate limit") {
                Err(NonRetryableError::RateLimitExceeded(
                    "GitHub API rate limit exceeded".to_string(),
                ))
            } else {
                Err(NonRetryableError::Forbidden(url))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error for {}",
            s.as_u16(),
            url
        ))),
        // 5xx server errors are retryable
        _ => Ok(()),
    }
}

/// Checks if an error from `error_for_status()` should be retried.
/// Returns the original error if retryable, or a user-friendly NonRetryableError if not.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

/// Whether the request failed because the resource does not exist.
pub fn is_not_found(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<NonRetryableError>(),
        Some(NonRetryableError::NotFound(_))
    )
}

fn is_retryable_error(e: &anyhow::Error) -> bool {
    if e.downcast_ref::<NonRetryableError>().is_some() {
        return false;
    }

    let error_str = format!("{:#}", e).to_lowercase();
    error_str.contains("connection")
        || error_str.contains("timeout")
        || error_str.contains("timed out")
        || error_str.contains("reset")
        || error_str.contains("broken pipe")
        || error_str.contains("dns")
        || error_str.contains("resolve")
}

/// Executes an async operation with retry logic.
/// Only retries on network errors; fails immediately on client errors (4xx).
pub async fn with_retry<F, Fut, T>(operation_name: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable_error(&e) {
                    debug!("{}: non-retryable error: {:#}", operation_name, e);
                    return Err(e);
                }

                if attempt < MAX_RETRIES {
                    warn!(
                        "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                        operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)))
}
