//! Per-run execution context.
//!
//! Maps an intent name to the data returned by the most recent successful
//! sub-task with that intent.  One context exists per orchestration run;
//! only the orchestrator mutates it, handlers get a shared reference.
//!
//! Values are opaque JSON at this layer because sub-task results are
//! heterogeneous.  A handler that reads another intent's result should go
//! through [`ExecutionContext::get_as`], which validates the shape it
//! expects instead of trusting it.
//!
//! # Example
//!
//! ```rust
//! # use taskweave_kernel::ExecutionContext;
//! # use serde::Deserialize;
//! #[derive(Deserialize)]
//! struct SearchResult {
//!     hits: u32,
//! }
//!
//! let mut ctx = ExecutionContext::new();
//! ctx.record("Search", serde_json::json!({"hits": 5}));
//!
//! let found: SearchResult = ctx.get_as("Search").unwrap();
//! assert_eq!(found.hits, 5);
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SkillError;

/// Intent-keyed store of prior sub-task results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw result recorded for `intent`, if any.
    pub fn get(&self, intent: &str) -> Option<&Value> {
        self.entries.get(intent)
    }

    /// Deserialize the result recorded for `intent` into `T`.
    ///
    /// Fails with [`SkillError::MissingContext`] when nothing is recorded and
    /// with [`SkillError::ContextShape`] when the stored value does not match
    /// `T`.
    pub fn get_as<T: DeserializeOwned>(&self, intent: &str) -> Result<T, SkillError> {
        let value = self.get(intent).ok_or_else(|| SkillError::MissingContext {
            intent: intent.to_string(),
        })?;

        T::deserialize(value).map_err(|e| SkillError::ContextShape {
            intent: intent.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.entries.contains_key(intent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in intent-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Record a successful result, replacing any earlier one for the intent.
    pub fn record(&mut self, intent: impl Into<String>, data: Value) {
        let intent = intent.into();
        tracing::trace!(intent = %intent, "context entry recorded");
        self.entries.insert(intent, data);
    }

    /// Drop the entry for `intent` (its latest attempt did not succeed).
    pub fn forget(&mut self, intent: &str) -> Option<Value> {
        let removed = self.entries.remove(intent);
        if removed.is_some() {
            tracing::debug!(intent = %intent, "stale context entry removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Hits {
        hits: u32,
    }

    #[test]
    fn record_replaces_previous_value() {
        let mut ctx = ExecutionContext::new();
        ctx.record("Search", json!({"hits": 1}));
        ctx.record("Search", json!({"hits": 2}));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("Search"), Some(&json!({"hits": 2})));
    }

    #[test]
    fn get_as_missing_entry() {
        let ctx = ExecutionContext::new();
        let err = ctx.get_as::<Hits>("Search").unwrap_err();
        assert!(matches!(err, SkillError::MissingContext { ref intent } if intent == "Search"));
    }

    #[test]
    fn get_as_wrong_shape() {
        let mut ctx = ExecutionContext::new();
        ctx.record("Search", json!({"hits": "many"}));
        let err = ctx.get_as::<Hits>("Search").unwrap_err();
        assert!(matches!(err, SkillError::ContextShape { .. }));
    }

    #[test]
    fn forget_removes_entry() {
        let mut ctx = ExecutionContext::new();
        ctx.record("Search", json!({"hits": 5}));
        assert!(ctx.forget("Search").is_some());
        assert!(!ctx.contains("Search"));
        assert!(ctx.forget("Search").is_none());
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut ctx = ExecutionContext::new();
        ctx.record("B", json!(2));
        ctx.record("A", json!(1));
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"A": 1, "B": 2}));
        let keys: Vec<&str> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }
}
