//! HTTP retry helpers for transient errors.
//!
//! Every fetcher goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so each request gets
//! automatic retry with exponential backoff for timeouts, connection
//! resets, server errors, and rate limiting.
//!
//! ```ignore
//! let body = retry::send_json(&RetryPolicy::default(), || client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after connection errors, timeouts, HTTP 429, and HTTP 5xx.
    pub max_retries: u32,
    /// Full re-fetches after a body that fails to decode as JSON.
    pub max_body_retries: u32,
    /// Delay before the first retry. Doubles on each subsequent attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries at 1s, 2s, 4s, and one body re-fetch.
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_body_retries: 1,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            max_body_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Whether an HTTP status is worth retrying.
#[must_use]
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// Connection-level failures are retried per [`RetryPolicy::max_retries`];
/// a body that arrives but fails to decode triggers a full re-fetch up to
/// [`RetryPolicy::max_body_retries`] times. HTTP 4xx other than 429 is
/// permanent.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after all retries, the
/// server returns a non-retryable status, or the body cannot be parsed.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    policy: &RetryPolicy,
    build_request: F,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut body_attempt = 0;

    loop {
        let response = send_inner(policy, &build_request).await?;
        let url = response.url().to_string();
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str(&text) {
            Ok(value) => return Ok(value),
            Err(e) => {
                let preview = text
                    .char_indices()
                    .nth(BODY_PREVIEW_LEN)
                    .map_or(text.as_str(), |(idx, _)| &text[..idx]);

                if body_attempt < policy.max_body_retries {
                    body_attempt += 1;
                    let delay = policy.backoff(body_attempt);
                    log::warn!(
                        "JSON parse failed (body retry {body_attempt}/{}), re-fetching in {delay:?}\n  \
                         url: {url}\n  status: {status}\n  parse error: {e}\n  body preview: {preview}",
                        policy.max_body_retries,
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                log::error!(
                    "JSON parse failed, giving up\n  url: {url}\n  status: {status}\n  \
                     received: {} bytes\n  parse error: {e}\n  body preview: {preview}",
                    text.len(),
                );
                return Err(SourceError::Json(e));
            }
        }
    }
}

/// Core retry loop. Returns the first response with a 2xx/3xx status.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    policy: &RetryPolicy,
    build_request: &F,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < policy.max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(SourceError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) {
                    if attempt < policy.max_retries {
                        log::warn!("  HTTP {status}");
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::Upstream {
                        message: format!("HTTP {status} after {} retries", policy.max_retries),
                    });
                }

                if status.is_client_error() {
                    return Err(SourceError::Upstream {
                        message: format!("HTTP {status}"),
                    });
                }

                return Ok(response);
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(64), Duration::from_secs(u64::from(u32::MAX)));
        assert_eq!(RetryPolicy::none().backoff(5), Duration::ZERO);
    }

    #[test]
    fn retries_rate_limits_and_server_errors_only() {
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(reqwest::StatusCode::OK));
    }
}
