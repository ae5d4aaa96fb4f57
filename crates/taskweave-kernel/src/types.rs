//! Sub-task data model.
//!
//! [`SubTaskSpec`] is produced upstream (by the NLU step) and never changes
//! once handed to the orchestrator.  [`SubTaskOutcome`] records what
//! happened to one sub-task; outcomes are created once and appended to the
//! run's outcome log.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handler-specific parameters of a sub-task.
pub type Parameters = Map<String, Value>;

// ---------------------------------------------------------------------------
// Sub-task specification
// ---------------------------------------------------------------------------

/// One atomic intent extracted from a larger user request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskSpec {
    /// Selects the handler (e.g. `SearchEmail`, `CreateTask`).
    pub intent: String,
    /// Handler-specific parameters.
    #[serde(default)]
    pub parameters: Parameters,
    /// Human-readable description, used only in reporting.
    #[serde(default)]
    pub summary: String,
}

impl SubTaskSpec {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            parameters: Parameters::new(),
            summary: String::new(),
        }
    }

    /// Builder: set the parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Builder: set a single parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Builder: set the human-readable summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal status of one attempted sub-task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The handler ran to completion.
    Success,
    /// The handler returned an error or panicked.
    Failure,
    /// No handler is registered for the intent.
    Skipped,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// What happened to one sub-task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskOutcome {
    /// The sub-task this outcome belongs to.
    pub sub_task: SubTaskSpec,
    /// Zero-based position in the outcome log.
    pub order: usize,
    pub status: OutcomeStatus,
    /// Handler summary on success, a short failure line otherwise.
    pub message: String,
    /// Data the handler returned (success only).
    pub returned_data: Option<Value>,
    /// User-facing error text (failure and skipped only).
    pub error_detail: Option<String>,
    /// Wall-clock time spent in the handler.
    #[serde(default)]
    pub duration_ms: u64,
}

impl SubTaskOutcome {
    /// Outcome for a handler that ran to completion.
    pub fn success(
        sub_task: SubTaskSpec,
        order: usize,
        message: impl Into<String>,
        returned_data: Value,
    ) -> Self {
        Self {
            sub_task,
            order,
            status: OutcomeStatus::Success,
            message: message.into(),
            returned_data: Some(returned_data),
            error_detail: None,
            duration_ms: 0,
        }
    }

    /// Outcome for a handler that failed.
    pub fn failure(sub_task: SubTaskSpec, order: usize, error_detail: impl Into<String>) -> Self {
        let message = format!("failed to execute {}", sub_task.intent);
        Self {
            sub_task,
            order,
            status: OutcomeStatus::Failure,
            message,
            returned_data: None,
            error_detail: Some(error_detail.into()),
            duration_ms: 0,
        }
    }

    /// Outcome for an intent with no registered handler.
    pub fn skipped(sub_task: SubTaskSpec, order: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            sub_task,
            order,
            status: OutcomeStatus::Skipped,
            message: reason.clone(),
            returned_data: None,
            error_detail: Some(reason),
            duration_ms: 0,
        }
    }

    /// Builder: record how long the handler took.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// The intent of the sub-task this outcome belongs to.
    pub fn intent(&self) -> &str {
        &self.sub_task.intent
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failure
    }
}
