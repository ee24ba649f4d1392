//! HTTP utilities for Okta REST API calls
//!
//! One GET primitive with SSWS authentication, response sanitization for
//! logging, and bounded retry on HTTP 429. Everything else (pagination,
//! partial-result policies) lives a layer up in [`super::pagination`].

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the Unix timestamp at which the rate-limit window resets
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A successful (2xx) API response
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Decoded JSON body; `Value::Null` for empty bodies
    pub body: Value,
    /// Raw `Link` header, if the server sent one
    pub link: Option<String>,
}

/// Failure classification for a single endpoint fetch.
///
/// Only `RateLimitExhausted` involved any retrying; transport errors are
/// never retried and always propagate as hard failures.
#[derive(Debug, Error)]
pub enum HttpError {
    /// DNS/TLS/connection failures, including errors while reading the body
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint kept answering 429 until the retry budget ran out
    #[error("rate limited at {url} after {attempts} attempts")]
    RateLimitExhausted { url: String, attempts: u32 },

    /// Any other non-2xx status
    #[error("API request failed: {status} at {url}")]
    Status { url: String, status: u16 },

    /// The server answered 2xx with a body that is not JSON
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Retry behavior for rate-limited requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries per endpoint, including the first
    pub max_attempts: u32,
    /// Sleep used when the 429 response carries no reset header
    pub fallback_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            fallback_backoff: Duration::from_secs(60),
        }
    }
}

/// HTTP client wrapper for Okta API calls
#[derive(Clone)]
pub struct OktaHttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl OktaHttpClient {
    /// Create a new HTTP client with the default retry policy
    pub fn new() -> Result<Self> {
        Self::with_retry(RetryPolicy::default())
    }

    /// Create a new HTTP client with an explicit retry policy
    pub fn with_retry(retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("oktf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, retry })
    }

    /// Make an authenticated GET request.
    ///
    /// Retries only on 429, honoring the server's reset timestamp when
    /// present. The calling task blocks for the whole backoff.
    pub async fn get(&self, url: &str, token: &str) -> Result<ApiResponse, HttpError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tracing::debug!("GET {}", url);

            let response = self
                .client
                .get(url)
                .header("Authorization", format!("SSWS {token}"))
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|source| HttpError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retry.max_attempts {
                    return Err(HttpError::RateLimitExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }
                let wait = rate_limit_backoff(
                    response.headers().get(RATE_LIMIT_RESET_HEADER),
                    self.retry.fallback_backoff,
                );
                tracing::warn!(
                    "Rate limited at {} (attempt {}/{}), sleeping {}s",
                    url,
                    attempt,
                    self.retry.max_attempts,
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let link = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            let body = response
                .text()
                .await
                .map_err(|source| HttpError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            if !status.is_success() {
                // Security: only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
                return Err(HttpError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&body).map_err(|source| HttpError::Decode {
                    url: url.to_string(),
                    source,
                })?
            };

            return Ok(ApiResponse { status, body, link });
        }
    }
}

/// Sleep duration for a 429 response: `max(1, reset - now)` seconds when the
/// reset header is a Unix timestamp, otherwise the policy fallback
fn rate_limit_backoff(reset_header: Option<&HeaderValue>, fallback: Duration) -> Duration {
    let reset = reset_header
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok());

    match reset {
        Some(timestamp) => {
            let now = Utc::now().timestamp();
            Duration::from_secs(timestamp.saturating_sub(now).max(1) as u64)
        }
        None => fallback,
    }
}

/// Format an Okta API error for display
pub fn format_okta_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("401") {
        return "Authentication failed. Check your Okta API token.".to_string();
    }
    if error_str.contains("403") {
        return "Permission denied. The token needs an admin role for this endpoint.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("rate limited") || error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Okta service temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("transport error") {
        return "Request failed. Check your network connection and the org URL.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{sanitized}...")
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_uses_reset_timestamp() {
        let reset = (Utc::now().timestamp() + 5).to_string();
        let header = HeaderValue::from_str(&reset).unwrap();
        let wait = rate_limit_backoff(Some(&header), Duration::from_secs(60));
        assert!(wait >= Duration::from_secs(4) && wait <= Duration::from_secs(6));
    }

    #[test]
    fn backoff_is_at_least_one_second() {
        // Reset timestamp already in the past
        let reset = (Utc::now().timestamp() - 30).to_string();
        let header = HeaderValue::from_str(&reset).unwrap();
        let wait = rate_limit_backoff(Some(&header), Duration::from_secs(60));
        assert_eq!(wait, Duration::from_secs(1));
    }

    #[test]
    fn backoff_falls_back_without_header() {
        let wait = rate_limit_backoff(None, Duration::from_secs(60));
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn backoff_falls_back_on_garbage_header() {
        let header = HeaderValue::from_static("not-a-timestamp");
        let wait = rate_limit_backoff(Some(&header), Duration::from_secs(60));
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.len() < body.len());
    }
}
