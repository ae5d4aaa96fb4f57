//! `SendWebhook` skill.
//!
//! Posts a JSON payload to a caller-supplied URL, optionally embedding the
//! result of an earlier sub-task.
//!
//! Parameters:
//! - `url` (string, required; `http` or `https`)
//! - `payload` (object, optional)
//! - `include_results_from` (string, optional): an intent whose recorded
//!   result is embedded under `context` in the posted body

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use taskweave_kernel::{ExecutionContext, Parameters, SkillError, SkillHandler, SkillOutput};
use tracing::debug;
use url::Url;

use crate::http::ResilientHttpClient;

const SERVICE: &str = "webhook";

/// Webhook delivery handler.
pub struct WebhookSkill {
    http: Arc<ResilientHttpClient>,
}

impl WebhookSkill {
    pub const INTENT: &'static str = "SendWebhook";

    pub fn new(http: Arc<ResilientHttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SkillHandler for WebhookSkill {
    async fn handle(
        &self,
        _user_id: &str,
        parameters: &Parameters,
        context: &ExecutionContext,
    ) -> std::result::Result<SkillOutput, SkillError> {
        let url = target_url(parameters)?;
        let body = build_body(parameters, context)?;
        let host = url.host_str().unwrap_or_default().to_owned();

        debug!(host = %host, "delivering webhook");
        let response = self
            .http
            .post_json("webhook", &url, &body)
            .await
            .map_err(|e| SkillError::service(SERVICE, e))?;

        Ok(SkillOutput::new(
            json!({ "url": url.as_str(), "delivered": true, "response": response }),
            format!("delivered payload to {host}"),
        ))
    }
}

/// Validated destination.
fn target_url(parameters: &Parameters) -> std::result::Result<Url, SkillError> {
    let raw = parameters
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| SkillError::invalid_parameters("`url` is required"))?;

    let url = Url::parse(raw)
        .map_err(|e| SkillError::invalid_parameters(format!("`url` is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(SkillError::invalid_parameters("`url` must be an http(s) URL with a host"));
    }
    Ok(url)
}

/// The JSON body to post.
pub fn build_body(
    parameters: &Parameters,
    context: &ExecutionContext,
) -> std::result::Result<Value, SkillError> {
    let mut body = match parameters.get("payload") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(payload)) => payload.clone(),
        Some(_) => return Err(SkillError::invalid_parameters("`payload` must be an object")),
    };

    match parameters.get("include_results_from") {
        None | Some(Value::Null) => {}
        Some(Value::String(intent)) => {
            let result = context.get(intent).ok_or_else(|| SkillError::MissingContext {
                intent: intent.clone(),
            })?;
            body.insert("context".into(), result.clone());
        }
        Some(_) => {
            return Err(SkillError::invalid_parameters(
                "`include_results_from` must be an intent name",
            ));
        }
    }

    Ok(Value::Object(body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn body_embeds_earlier_result() {
        let mut context = ExecutionContext::new();
        context.record("SearchWeb", json!({"hits": 2}));

        let body = build_body(
            &params(json!({"payload": {"text": "hi"}, "include_results_from": "SearchWeb"})),
            &context,
        )
        .unwrap();
        assert_eq!(body, json!({"text": "hi", "context": {"hits": 2}}));
    }

    #[test]
    fn body_defaults_to_empty_object() {
        let body = build_body(&Parameters::new(), &ExecutionContext::new()).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn missing_dependency_is_reported() {
        let err = build_body(
            &params(json!({"include_results_from": "SearchWeb"})),
            &ExecutionContext::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SkillError::MissingContext { intent } if intent == "SearchWeb"));
    }

    #[test]
    fn non_object_payload_is_invalid() {
        let err = build_body(&params(json!({"payload": [1]})), &ExecutionContext::new()).unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameters { .. }));
    }

    #[test]
    fn url_must_be_http() {
        assert!(target_url(&params(json!({"url": "https://hooks.example.com/x"}))).is_ok());
        assert!(target_url(&params(json!({"url": "ftp://example.com"}))).is_err());
        assert!(target_url(&params(json!({"url": "not a url"}))).is_err());
        assert!(target_url(&Parameters::new()).is_err());
    }
}
