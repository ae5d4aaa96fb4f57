//! NLU response parsing.
//!
//! The upstream language-understanding step answers with a JSON object
//! naming an `intent` and its `entities`.  A complex request carries its
//! sub-tasks inside the entities:
//!
//! ```json
//! {
//!   "intent": "ComplexTask",
//!   "entities": {
//!     "original_query": "find Alice's mail and create a follow-up",
//!     "sub_tasks": [
//!       {"intent": "SearchEmail", "entities": {"from": "alice"}, "summary_for_sub_task": "find mail"},
//!       {"intent": "CreateTask", "entities": {"title": "Follow up"}}
//!     ]
//!   }
//! }
//! ```
//!
//! Responses are often wrapped in markdown code fences; those are stripped
//! before parsing.

use serde_json::{Map, Value};
use taskweave_kernel::{Parameters, SubTaskSpec};

use crate::error::{AgentError, Result};
use crate::orchestrator::SequentialItem;

/// Intent name of a multi-step request.
pub const COMPLEX_TASK_INTENT: &str = "ComplexTask";

/// Intent name used when the NLU step needs more input from the user.
pub const NEEDS_CLARIFICATION_INTENT: &str = "NeedsClarification";

/// What the upstream NLU step asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum NluRequest {
    /// A multi-step request for the orchestrator.
    Complex {
        original_query: String,
        sub_tasks: Vec<SubTaskSpec>,
    },
    /// The user has to answer a question before anything can run.
    Clarification { question: String },
    /// The NLU step could not determine an intent.
    Unrecognized,
    /// A single action.
    Single(SequentialItem),
}

/// Parse an NLU response.
pub fn parse_nlu_response(text: &str) -> Result<NluRequest> {
    let json = extract_json_block(text);
    let root: Value = serde_json::from_str(json).map_err(|e| AgentError::NluParse {
        reason: format!("response is not valid JSON: {e}"),
    })?;

    let Some(object) = root.as_object() else {
        return Err(nlu_error("response is not a JSON object"));
    };

    let intent = match object.get("intent") {
        None => return Err(nlu_error("response has no `intent` field")),
        Some(Value::Null) => return Ok(NluRequest::Unrecognized),
        Some(Value::String(intent)) => intent.as_str(),
        Some(_) => return Err(nlu_error("`intent` must be a string or null")),
    };

    let entities = entities_of(object)?;

    match intent {
        COMPLEX_TASK_INTENT => parse_complex(object, &entities),
        NEEDS_CLARIFICATION_INTENT => {
            let question = object
                .get("clarification_question")
                .or_else(|| entities.get("clarification_question"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            Ok(NluRequest::Clarification { question })
        }
        other => Ok(NluRequest::Single(SequentialItem::new(other, entities))),
    }
}

fn parse_complex(root: &Map<String, Value>, entities: &Parameters) -> Result<NluRequest> {
    let original_query = entities
        .get("original_query")
        .and_then(Value::as_str)
        .or_else(|| root.get("originalMessage").and_then(Value::as_str))
        .unwrap_or_default()
        .to_owned();

    let raw = match entities.get("sub_tasks") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => return Err(nlu_error("`sub_tasks` must be an array")),
        None => &[],
    };

    let sub_tasks = raw
        .iter()
        .enumerate()
        .map(|(index, item)| parse_sub_task(index, item))
        .collect::<Result<Vec<_>>>()?;

    Ok(NluRequest::Complex {
        original_query,
        sub_tasks,
    })
}

fn parse_sub_task(index: usize, item: &Value) -> Result<SubTaskSpec> {
    let Some(object) = item.as_object() else {
        return Err(AgentError::MalformedSubTask {
            index,
            reason: "not a JSON object".into(),
        });
    };

    let intent = match object.get("intent") {
        Some(Value::String(intent)) if !intent.trim().is_empty() => intent.clone(),
        _ => {
            return Err(AgentError::MalformedSubTask {
                index,
                reason: "intent is missing".into(),
            });
        }
    };

    let parameters = match object.get("entities") {
        None | Some(Value::Null) => Parameters::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(AgentError::MalformedSubTask {
                index,
                reason: "entities must be an object".into(),
            });
        }
    };

    let summary = object
        .get("summary_for_sub_task")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(SubTaskSpec::new(intent)
        .with_parameters(parameters)
        .with_summary(summary))
}

fn entities_of(object: &Map<String, Value>) -> Result<Parameters> {
    match object.get("entities") {
        None | Some(Value::Null) => Ok(Parameters::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(nlu_error("`entities` must be an object")),
    }
}

fn nlu_error(reason: &str) -> AgentError {
    AgentError::NluParse {
        reason: reason.to_owned(),
    }
}

/// Strip markdown code fences, if any.
///
/// Text that already parses as JSON is returned as is, so fences inside
/// string values are left alone.
fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    if serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok() {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```json") {
        let json_start = start + "```json".len();
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    trimmed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
