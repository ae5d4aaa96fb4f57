//! `SearchWeb` skill.
//!
//! Queries a Brave-compatible JSON search API.  Best-effort by default: a
//! failed web search does not abort the run.
//!
//! Parameters:
//! - `query` (string, required)
//! - `max_results` (integer, optional; capped at [`MAX_RESULTS_CAP`])
//!
//! Returned data, readable by later sub-tasks as `SearchWeb`:
//!
//! ```json
//! {"query": "...", "hits": 2, "results": [{"title": "...", "url": "...", "snippet": "..."}]}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use taskweave_agent::SearchConfig;
use taskweave_kernel::{ExecutionContext, Parameters, SkillError, SkillHandler, SkillOutput};
use tracing::debug;
use url::Url;

use crate::error::{AdapterError, Result};
use crate::http::ResilientHttpClient;

/// Service name used in user-facing errors.
const SERVICE: &str = "web search";

/// Upper bound on `max_results`.
pub const MAX_RESULTS_CAP: u64 = 20;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search handler.
pub struct WebSearchSkill {
    http: Arc<ResilientHttpClient>,
    endpoint: Url,
    api_key: Option<String>,
    max_results: u64,
}

impl WebSearchSkill {
    pub const INTENT: &'static str = "SearchWeb";

    pub fn new(
        http: Arc<ResilientHttpClient>,
        endpoint: Url,
        api_key: Option<String>,
        max_results: u64,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_results: max_results.clamp(1, MAX_RESULTS_CAP),
        }
    }

    /// Build from `[search]` settings, reading the API key from the
    /// environment variable named by `api_key_env`.
    pub fn from_config(http: Arc<ResilientHttpClient>, config: &SearchConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| AdapterError::InvalidUrl {
            url: config.endpoint.clone(),
            reason: e.to_string(),
        })?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            debug!(env = %config.api_key_env, "web search api key not set");
        }
        Ok(Self::new(http, endpoint, api_key, u64::from(config.max_results)))
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_url(&self, query: &str, count: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &count.to_string());
        url
    }
}

#[async_trait]
impl SkillHandler for WebSearchSkill {
    async fn handle(
        &self,
        _user_id: &str,
        parameters: &Parameters,
        _context: &ExecutionContext,
    ) -> std::result::Result<SkillOutput, SkillError> {
        let query = parameters
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| SkillError::invalid_parameters("`query` is required"))?;

        let count = match parameters.get("max_results") {
            None | Some(Value::Null) => self.max_results,
            Some(value) => value
                .as_u64()
                .filter(|n| *n > 0)
                .ok_or_else(|| SkillError::invalid_parameters("`max_results` must be a positive integer"))?
                .min(MAX_RESULTS_CAP),
        };

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SkillError::NotConfigured {
                service: SERVICE.into(),
            });
        };

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(api_key)
            .map_err(|_| SkillError::Failed("web search api key is not a valid header value".into()))?;
        headers.insert("X-Subscription-Token", token);

        debug!(query, count, "performing web search");
        let body = self
            .http
            .get_json("web_search", &self.request_url(query, count), &headers)
            .await
            .map_err(|e| SkillError::service(SERVICE, e))?;

        let results = parse_results(&body, count as usize);
        let hits = results.len();
        Ok(SkillOutput::new(
            json!({ "query": query, "hits": hits, "results": results }),
            format!("found {hits} results for \"{query}\""),
        ))
    }
}

/// Pull hits out of a Brave-style `{"web": {"results": [...]}}` body.
pub fn parse_results(body: &Value, max_results: usize) -> Vec<SearchHit> {
    let Some(items) = body.pointer("/web/results").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(Value::as_str).unwrap_or("");
            let url = item.get("url").and_then(Value::as_str).unwrap_or("");
            let snippet = item.get("description").and_then(Value::as_str).unwrap_or("");
            if title.is_empty() && url.is_empty() {
                return None;
            }
            Some(SearchHit {
                title: strip_html_tags(title),
                url: url.to_owned(),
                snippet: strip_html_tags(snippet),
            })
        })
        .take(max_results)
        .collect()
}

/// Drop markup and decode the handful of entities search APIs emit.
pub fn strip_html_tags(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut inside_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' => inside_tag = false,
            _ if !inside_tag => result.push(ch),
            _ => {}
        }
    }

    result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskweave_kernel::RetryPolicy;

    fn skill(api_key: Option<&str>) -> WebSearchSkill {
        let http = ResilientHttpClient::new(
            "taskweave-test",
            Duration::from_secs(1),
            RetryPolicy::new(1, Duration::ZERO),
        )
        .unwrap();
        WebSearchSkill::new(
            Arc::new(http),
            Url::parse("http://127.0.0.1:9/search").unwrap(),
            api_key.map(str::to_owned),
            5,
        )
    }

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn parse_brave_results() {
        let body = json!({"web": {"results": [
            {"title": "<strong>Rust</strong> Lang", "url": "https://rust-lang.org", "description": "A language &amp; more"},
            {"title": "", "url": "", "description": "dropped"},
            {"title": "Docs", "url": "https://doc.rust-lang.org"}
        ]}});
        let hits = parse_results(&body, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust Lang");
        assert_eq!(hits[0].snippet, "A language & more");
        assert_eq!(hits[1].snippet, "");
        assert_eq!(parse_results(&body, 1).len(), 1);
    }

    #[test]
    fn parse_unexpected_body_yields_nothing() {
        assert!(parse_results(&json!({"error": "quota"}), 5).is_empty());
    }

    #[test]
    fn strip_tags_and_entities() {
        assert_eq!(strip_html_tags("<b>hello</b> world"), "hello world");
        assert_eq!(strip_html_tags("&lt;tag&gt; &quot;q&quot;"), "<tag> \"q\"");
        assert_eq!(strip_html_tags("&amp;lt;"), "&lt;");
    }

    #[test]
    fn request_url_encodes_query() {
        let url = skill(Some("k")).request_url("rust async & tokio", 3);
        assert_eq!(url.query(), Some("q=rust+async+%26+tokio&count=3"));
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let err = skill(Some("k"))
            .handle("u", &params(json!({"query": "  "})), &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let skill = skill(None);
        assert!(!skill.is_configured());
        let err = skill
            .handle("u", &params(json!({"query": "rust"})), &ExecutionContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "web search is not configured");
    }

    #[tokio::test]
    async fn bad_max_results_is_invalid() {
        let err = skill(Some("k"))
            .handle(
                "u",
                &params(json!({"query": "rust", "max_results": -1})),
                &ExecutionContext::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameters { .. }));
    }
}
