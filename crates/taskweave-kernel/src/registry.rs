//! Intent-to-handler registry.
//!
//! Skill handlers register under an intent name while the process starts
//! up, via [`HandlerRegistryBuilder`].  [`HandlerRegistryBuilder::build`]
//! freezes the table into an immutable [`HandlerRegistry`] that is shared as
//! an `Arc` across concurrent orchestration runs without any locking.
//!
//! # Example
//!
//! ```rust
//! # use taskweave_kernel::{HandlerRegistry, SkillOutput};
//! # use futures::FutureExt;
//! let registry = HandlerRegistry::builder()
//!     .register_fn("Ping", |_user, _params, _ctx| {
//!         async { Ok(SkillOutput::new(serde_json::json!("pong"), "replied")) }.boxed()
//!     })
//!     .unwrap()
//!     .build();
//!
//! assert!(registry.contains("Ping"));
//! assert!(registry.get("Pong").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::{KernelError, Result, SkillError};
use crate::types::Parameters;

// ---------------------------------------------------------------------------
// Handler interface
// ---------------------------------------------------------------------------

/// What a handler returns when it runs to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillOutput {
    /// Data made available to later sub-tasks through the context.
    pub data: Value,
    /// The handler's own summary of what it did (e.g. "found 3 emails").
    pub message: String,
}

impl SkillOutput {
    pub fn new(data: Value, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

/// A skill handler: performs one intent against an external service.
///
/// Handlers receive the context read-only.  A handler that reads another
/// intent's result documents the shape it expects and reads it through
/// [`ExecutionContext::get_as`].  Retries, if any, happen inside the handler
/// through [`crate::retry::execute`].
#[async_trait]
pub trait SkillHandler: Send + Sync {
    async fn handle(
        &self,
        user_id: &str,
        parameters: &Parameters,
        context: &ExecutionContext,
    ) -> std::result::Result<SkillOutput, SkillError>;
}

type HandlerFn = dyn for<'a> Fn(
        &'a str,
        &'a Parameters,
        &'a ExecutionContext,
    ) -> BoxFuture<'a, std::result::Result<SkillOutput, SkillError>>
    + Send
    + Sync;

/// Adapts an async closure to [`SkillHandler`].
struct FnHandler {
    f: Box<HandlerFn>,
}

#[async_trait]
impl SkillHandler for FnHandler {
    async fn handle(
        &self,
        user_id: &str,
        parameters: &Parameters,
        context: &ExecutionContext,
    ) -> std::result::Result<SkillOutput, SkillError> {
        (self.f)(user_id, parameters, context).await
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutable registration phase of the registry.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn SkillHandler>>,
}

impl HandlerRegistryBuilder {
    /// Register `handler` for `intent`.
    ///
    /// Registering the same intent twice is an error rather than a silent
    /// overwrite.
    pub fn register(
        mut self,
        intent: impl Into<String>,
        handler: Arc<dyn SkillHandler>,
    ) -> Result<Self> {
        let intent = intent.into();
        if intent.trim().is_empty() {
            return Err(KernelError::EmptyIntent);
        }
        if self.handlers.contains_key(&intent) {
            return Err(KernelError::DuplicateIntent { intent });
        }

        tracing::debug!(intent = %intent, "skill handler registered");
        self.handlers.insert(intent, handler);
        Ok(self)
    }

    /// Register an async closure for `intent`.
    pub fn register_fn<F>(self, intent: impl Into<String>, f: F) -> Result<Self>
    where
        F: for<'a> Fn(
                &'a str,
                &'a Parameters,
                &'a ExecutionContext,
            ) -> BoxFuture<'a, std::result::Result<SkillOutput, SkillError>>
            + Send
            + Sync
            + 'static,
    {
        self.register(intent, Arc::new(FnHandler { f: Box::new(f) }))
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        tracing::info!(handlers = self.handlers.len(), "handler registry built");
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable intent-to-handler table.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn SkillHandler>>,
}

impl HandlerRegistry {
    /// Start a new registration phase.
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Handler registered for `intent`, if any.
    pub fn get(&self, intent: &str) -> Option<&Arc<dyn SkillHandler>> {
        self.handlers.get(intent)
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.handlers.contains_key(intent)
    }

    /// Registered intent names, sorted.
    pub fn intents(&self) -> Vec<&str> {
        let mut intents: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        intents.sort_unstable();
        intents
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut intents: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        intents.sort_unstable();
        f.debug_struct("HandlerRegistryBuilder")
            .field("intents", &intents)
            .finish()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("intents", &self.intents())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl SkillHandler for Echo {
        async fn handle(
            &self,
            user_id: &str,
            parameters: &Parameters,
            _context: &ExecutionContext,
        ) -> std::result::Result<SkillOutput, SkillError> {
            Ok(SkillOutput::new(
                json!({"user": user_id, "params": parameters}),
                "echoed",
            ))
        }
    }

    #[test]
    fn duplicate_intent_rejected() {
        let result = HandlerRegistry::builder()
            .register("Echo", Arc::new(Echo))
            .unwrap()
            .register("Echo", Arc::new(Echo));
        assert!(matches!(result, Err(KernelError::DuplicateIntent { ref intent }) if intent == "Echo"));
    }

    #[test]
    fn empty_intent_rejected() {
        let result = HandlerRegistry::builder().register("  ", Arc::new(Echo));
        assert!(matches!(result, Err(KernelError::EmptyIntent)));
    }

    #[test]
    fn intents_are_sorted() {
        let registry = HandlerRegistry::builder()
            .register("SearchWeb", Arc::new(Echo))
            .unwrap()
            .register("CreateTask", Arc::new(Echo))
            .unwrap()
            .build();
        assert_eq!(registry.intents(), vec!["CreateTask", "SearchWeb"]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn registered_handler_is_invoked() {
        let registry = HandlerRegistry::builder()
            .register("Echo", Arc::new(Echo))
            .unwrap()
            .build();

        let mut params = Parameters::new();
        params.insert("q".into(), json!("hello"));

        let handler = registry.get("Echo").unwrap();
        let output = handler
            .handle("user-1", &params, &ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(output.message, "echoed");
        assert_eq!(output.data["user"], "user-1");
        assert_eq!(output.data["params"]["q"], "hello");
    }

    #[tokio::test]
    async fn closure_handler_reads_context() {
        let registry = HandlerRegistry::builder()
            .register_fn("Count", |_user, _params, ctx| {
                async move {
                    let n = ctx.len();
                    Ok(SkillOutput::new(json!(n), format!("saw {n} entries")))
                }
                .boxed()
            })
            .unwrap()
            .build();

        let mut ctx = ExecutionContext::new();
        ctx.record("Search", json!({"hits": 5}));

        let output = registry
            .get("Count")
            .unwrap()
            .handle("u", &Parameters::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(output.data, json!(1));
        assert_eq!(output.message, "saw 1 entries");
    }
}
