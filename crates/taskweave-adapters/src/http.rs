//! Resilient JSON-over-HTTP client.
//!
//! Every request goes through [`taskweave_kernel::execute`], so skills get
//! bounded retries and linear backoff without handling them themselves.
//! Transport failures are mapped onto [`CallError`]:
//!
//! | reqwest                        | `CallError`       |
//! |--------------------------------|-------------------|
//! | timed out                      | `Timeout`         |
//! | connect / request failure      | `Transport`       |
//! | non-2xx status                 | `Http { status }` |
//! | body is not the expected JSON  | `InvalidResponse` |

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use taskweave_agent::TaskweaveConfig;
use taskweave_kernel::{CallError, RetryPolicy, execute, retryable_with_statuses};
use tracing::debug;
use url::Url;

use crate::error::{AdapterError, Result};

/// Maximum number of body bytes echoed into debug logs for failed calls.
const MAX_LOGGED_BODY: usize = 512;

/// HTTP client wrapped in a retry policy.
#[derive(Debug, Clone)]
pub struct ResilientHttpClient {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl ResilientHttpClient {
    /// Build a client from `[http]` and `[retry]` settings.
    ///
    /// The retry classifier treats `http.retryable_statuses` as transient on
    /// top of the default 5xx/timeout/transport set.
    pub fn from_config(config: &TaskweaveConfig) -> Result<Self> {
        let policy = config
            .retry_policy()
            .with_shared_classifier(retryable_with_statuses(&config.http.retryable_statuses));
        Self::new(
            &config.http.user_agent,
            Duration::from_secs(config.http.request_timeout_secs),
            policy,
        )
    }

    pub fn new(user_agent: &str, request_timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .map_err(|e| AdapterError::Client {
                reason: e.to_string(),
            })?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json(
        &self,
        operation: &str,
        url: &Url,
        headers: &HeaderMap,
    ) -> std::result::Result<Value, CallError> {
        let client = &self.client;
        execute(&self.policy, operation, move || async move {
            let response = client
                .get(url.clone())
                .headers(headers.clone())
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .send()
                .await
                .map_err(map_reqwest_error)?;
            let body = read_success_body(operation, response).await?;
            serde_json::from_str(&body)
                .map_err(|e| CallError::invalid_response(format!("body is not JSON: {e}")))
        })
        .await
    }

    /// POST `body` as JSON to `url`.
    ///
    /// The response body is returned as JSON when it parses, as a JSON
    /// string when it does not, and as `null` when it is empty.
    pub async fn post_json(
        &self,
        operation: &str,
        url: &Url,
        body: &Value,
    ) -> std::result::Result<Value, CallError> {
        let client = &self.client;
        execute(&self.policy, operation, move || async move {
            let response = client
                .post(url.clone())
                .json(body)
                .send()
                .await
                .map_err(map_reqwest_error)?;
            let text = read_success_body(operation, response).await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        })
        .await
    }
}

/// Read the body of a response, failing on non-success statuses.
async fn read_success_body(
    operation: &str,
    response: reqwest::Response,
) -> std::result::Result<String, CallError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;

    if !status.is_success() {
        debug!(
            operation,
            status = status.as_u16(),
            body = %truncate(&body, MAX_LOGGED_BODY),
            "non-success response"
        );
        return Err(CallError::http(
            status.as_u16(),
            status.canonical_reason().unwrap_or("unexpected status"),
        ));
    }
    Ok(body)
}

/// Classify a reqwest failure.
pub fn map_reqwest_error(err: reqwest::Error) -> CallError {
    if err.is_timeout() {
        CallError::timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        CallError::invalid_response(err.to_string())
    } else if let Some(status) = err.status() {
        CallError::http(status.as_u16(), err.to_string())
    } else {
        CallError::transport(err.to_string())
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_retry_settings() {
        let mut config = TaskweaveConfig::default();
        config.retry.max_attempts = 5;
        let client = ResilientHttpClient::from_config(&config).unwrap();
        assert_eq!(client.policy().max_attempts(), 5);
        assert!(client.policy().is_retryable(&CallError::http(429, "Too Many Requests")));
        assert!(client.policy().is_retryable(&CallError::http(408, "Request Timeout")));
        assert!(!client.policy().is_retryable(&CallError::http(404, "Not Found")));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "h");
    }
}
