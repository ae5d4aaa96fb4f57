//! Report generator.
//!
//! Reduces an outcome log into an [`OrchestrationReport`].  The overall
//! status is a pure function of how many outcomes succeeded and failed:
//!
//! | Success | Failure | Status                                   |
//! |---------|---------|------------------------------------------|
//! | ≥ 1     | 0       | `CompletedFully`                         |
//! | ≥ 1     | ≥ 1     | `CompletedPartially`                     |
//! | 0       | ≥ 1     | `FailedEntirely`                         |
//! | 0       | 0       | `CompletedPartially` (nothing executable) |
//!
//! The last row covers a log of only skipped sub-tasks.  It is kept as
//! `CompletedPartially` pending product confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskweave_kernel::{ExecutionContext, OutcomeStatus, SubTaskOutcome};
use uuid::Uuid;

/// Summary line used when no sub-task could be executed at all.
pub const NOTHING_EXECUTABLE: &str =
    "Nothing was executable: none of the requested actions are supported.";

/// Overall result of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    CompletedFully,
    CompletedPartially,
    FailedEntirely,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompletedFully => write!(f, "completed fully"),
            Self::CompletedPartially => write!(f, "completed partially"),
            Self::FailedEntirely => write!(f, "failed entirely"),
        }
    }
}

/// Identity and timing of the run that produced a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Final, immutable result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub original_query: String,
    pub overall_status: OverallStatus,
    /// Plain-language lines: successes first, then failures.
    pub summary: String,
    /// Every attempted sub-task, in execution order.
    pub outcomes: Vec<SubTaskOutcome>,
    /// Context as it stood when the run ended.
    pub final_context: ExecutionContext,
    /// Present when the report came out of an orchestrator run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunInfo>,
}

impl OrchestrationReport {
    /// Builder: attach the run's final context.
    pub fn with_final_context(mut self, context: ExecutionContext) -> Self {
        self.final_context = context;
        self
    }

    /// Builder: attach run identity and timing.
    pub fn with_run_info(mut self, run: RunInfo) -> Self {
        self.run = Some(run);
        self
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Build a report from an outcome log.
///
/// Pure: the same log always yields the same status and summary.  The
/// final context starts empty and is attached by the orchestrator.
pub fn summarize(original_query: &str, outcomes: Vec<SubTaskOutcome>) -> OrchestrationReport {
    let overall_status = overall_status(&outcomes);
    let summary = summary_text(&outcomes);

    OrchestrationReport {
        original_query: original_query.to_owned(),
        overall_status,
        summary,
        outcomes,
        final_context: ExecutionContext::new(),
        run: None,
    }
}

/// Overall status from the status counts of `outcomes`.
pub fn overall_status(outcomes: &[SubTaskOutcome]) -> OverallStatus {
    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    let failures = outcomes.iter().filter(|o| o.is_failure()).count();

    match (successes, failures) {
        (0, 0) => OverallStatus::CompletedPartially,
        (_, 0) => OverallStatus::CompletedFully,
        (0, _) => OverallStatus::FailedEntirely,
        _ => OverallStatus::CompletedPartially,
    }
}

/// One line per success (`- intent: message`), then one line per failure
/// (`- intent: error detail`), each group in log order.  Skipped outcomes
/// are left out.
pub fn summary_text(outcomes: &[SubTaskOutcome]) -> String {
    let successes = outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| format!("- {}: {}", o.intent(), o.message));

    let failures = outcomes.iter().filter(|o| o.is_failure()).map(|o| {
        let detail = o.error_detail.as_deref().unwrap_or(&o.message);
        format!("- {}: {}", o.intent(), detail)
    });

    let lines: Vec<String> = successes.chain(failures).collect();
    if lines.is_empty() {
        return NOTHING_EXECUTABLE.to_owned();
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
