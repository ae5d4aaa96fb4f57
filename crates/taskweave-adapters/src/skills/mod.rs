//! Built-in skills.

pub mod web_search;
pub mod webhook;

use std::sync::Arc;

use taskweave_agent::TaskweaveConfig;
use taskweave_kernel::HandlerRegistryBuilder;
use tracing::info;

use crate::error::Result;
use crate::http::ResilientHttpClient;

pub use web_search::{SearchHit, WebSearchSkill};
pub use webhook::WebhookSkill;

/// Register every built-in skill on `builder`, sharing one HTTP client.
pub fn register_default_skills(
    builder: HandlerRegistryBuilder,
    config: &TaskweaveConfig,
) -> Result<HandlerRegistryBuilder> {
    let http = Arc::new(ResilientHttpClient::from_config(config)?);

    let search = WebSearchSkill::from_config(Arc::clone(&http), &config.search)?;
    if !search.is_configured() {
        info!(
            env = %config.search.api_key_env,
            "web search registered without an api key; SearchWeb will report not configured"
        );
    }

    let builder = builder
        .register(WebSearchSkill::INTENT, Arc::new(search))?
        .register(WebhookSkill::INTENT, Arc::new(WebhookSkill::new(http)))?;
    Ok(builder)
}
