//! Complex-task orchestrator.
//!
//! Drives an ordered list of sub-tasks strictly one after another.  Later
//! sub-tasks routinely depend on the results of earlier ones (a "create
//! follow-up" needs the "search" it follows up on), so there is no
//! reordering, batching or parallelism inside a run.
//!
//! Per run:
//!
//! 1. Start with an empty [`ExecutionContext`] and an empty outcome log.
//! 2. Dispatch each sub-task with the current context, append its outcome.
//! 3. On success, record the returned data under the sub-task's intent.
//! 4. On a failure of a *critical* intent, stop; remaining sub-tasks are
//!    never attempted and never appear in the log.
//! 5. Reduce the log into an [`OrchestrationReport`].
//!
//! Every intent is critical unless the [`CriticalityPolicy`] lists it as
//! best-effort.  Independent runs share nothing mutable, so one
//! [`Orchestrator`] can serve many runs concurrently.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskweave_kernel::{
    ExecutionContext, HandlerRegistry, OutcomeStatus, Parameters, SubTaskOutcome, SubTaskSpec,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::error::{AgentError, Result};
use crate::report::{self, OrchestrationReport, RunInfo};

/// Intents that are best-effort unless configured otherwise.
pub const DEFAULT_NON_CRITICAL_INTENTS: &[&str] = &["SearchWeb"];

// ---------------------------------------------------------------------------
// Criticality
// ---------------------------------------------------------------------------

/// Decides which failures abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalityPolicy {
    non_critical: HashSet<String>,
}

impl CriticalityPolicy {
    /// Every intent is critical except those in `non_critical`.
    pub fn new<I, S>(non_critical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_critical: non_critical.into_iter().map(Into::into).collect(),
        }
    }

    /// No best-effort intents at all.
    pub fn all_critical() -> Self {
        Self {
            non_critical: HashSet::new(),
        }
    }

    /// Whether a failure of `intent` aborts the run.
    pub fn is_critical(&self, intent: &str) -> bool {
        !self.non_critical.contains(intent)
    }

    /// Best-effort intents, sorted.
    pub fn non_critical_intents(&self) -> Vec<&str> {
        let mut intents: Vec<&str> = self.non_critical.iter().map(String::as_str).collect();
        intents.sort_unstable();
        intents
    }
}

impl Default for CriticalityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NON_CRITICAL_INTENTS.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Sequential entry point types
// ---------------------------------------------------------------------------

/// A bare intent for [`Orchestrator::run_sequential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialItem {
    pub intent: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl SequentialItem {
    pub fn new(intent: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            intent: intent.into(),
            parameters,
        }
    }
}

impl From<SequentialItem> for SubTaskSpec {
    fn from(item: SequentialItem) -> Self {
        SubTaskSpec::new(item.intent).with_parameters(item.parameters)
    }
}

/// Result of [`Orchestrator::run_sequential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialRunResult {
    pub outcomes: Vec<SubTaskOutcome>,
    pub final_context: ExecutionContext,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of a single run.  There is no pause or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Pending,
    Running,
    Completed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Mutable state owned by exactly one run.
struct RunLog {
    state: RunState,
    context: ExecutionContext,
    outcomes: Vec<SubTaskOutcome>,
}

impl RunLog {
    fn new(capacity: usize) -> Self {
        Self {
            state: RunState::Pending,
            context: ExecutionContext::new(),
            outcomes: Vec::with_capacity(capacity),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "run state changed");
        self.state = next;
    }

    /// Append an outcome and bring the context in line with it.
    fn append(&mut self, outcome: SubTaskOutcome) {
        match outcome.status {
            OutcomeStatus::Success => {
                let data = outcome.returned_data.clone().unwrap_or_default();
                self.context.record(outcome.intent(), data);
            }
            OutcomeStatus::Failure | OutcomeStatus::Skipped => {
                self.context.forget(outcome.intent());
            }
        }
        self.outcomes.push(outcome);
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs complex tasks against a frozen handler registry.
///
/// Cheap to clone; clones share the registry and policy.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    dispatcher: Dispatcher,
    criticality: Arc<CriticalityPolicy>,
}

impl Orchestrator {
    pub fn new(registry: Arc<HandlerRegistry>, criticality: CriticalityPolicy) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            criticality: Arc::new(criticality),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.dispatcher.registry()
    }

    pub fn criticality(&self) -> &CriticalityPolicy {
        &self.criticality
    }

    /// Execute `sub_tasks` in order on behalf of `user_id`.
    ///
    /// Only a structurally invalid sub-task list is an error.  Handler
    /// failures of any kind end up as outcomes in the returned report.
    pub async fn run(
        &self,
        original_query: &str,
        sub_tasks: Vec<SubTaskSpec>,
        user_id: &str,
    ) -> Result<OrchestrationReport> {
        validate(&sub_tasks)?;

        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let span = info_span!("orchestration", %run_id, user_id);

        let log = self.execute_all(sub_tasks, user_id).instrument(span).await;

        let report = report::summarize(original_query, log.outcomes)
            .with_final_context(log.context)
            .with_run_info(RunInfo {
                run_id,
                started_at,
                completed_at: Utc::now(),
            });

        info!(
            %run_id,
            status = %report.overall_status,
            outcomes = report.outcomes.len(),
            "orchestration finished"
        );

        Ok(report)
    }

    /// Execute a flat list of intents without the complex-task wrapper.
    ///
    /// Same ordering, context and abort rules as [`Orchestrator::run`].
    pub async fn run_sequential(
        &self,
        items: Vec<SequentialItem>,
        user_id: &str,
    ) -> Result<SequentialRunResult> {
        let sub_tasks: Vec<SubTaskSpec> = items.into_iter().map(SubTaskSpec::from).collect();
        validate(&sub_tasks)?;

        let run_id = Uuid::now_v7();
        let span = info_span!("orchestration", %run_id, user_id, sequential = true);
        let log = self.execute_all(sub_tasks, user_id).instrument(span).await;

        let summary = report::summary_text(&log.outcomes);
        Ok(SequentialRunResult {
            outcomes: log.outcomes,
            final_context: log.context,
            summary,
        })
    }

    /// The run loop.
    async fn execute_all(&self, sub_tasks: Vec<SubTaskSpec>, user_id: &str) -> RunLog {
        let total = sub_tasks.len();
        let mut log = RunLog::new(total);
        log.transition(RunState::Running);

        for (order, sub_task) in sub_tasks.into_iter().enumerate() {
            let critical = self.criticality.is_critical(&sub_task.intent);
            let outcome = self
                .dispatcher
                .dispatch(sub_task, &log.context, user_id, order)
                .await;

            let abort = critical && outcome.is_failure();
            let intent = outcome.intent().to_owned();
            log.append(outcome);

            if abort {
                warn!(
                    order,
                    intent = %intent,
                    not_attempted = total - order - 1,
                    "critical sub-task failed, aborting run"
                );
                break;
            }
        }

        log.transition(RunState::Completed);
        log
    }
}

/// Structural checks on a sub-task list.
fn validate(sub_tasks: &[SubTaskSpec]) -> Result<()> {
    if sub_tasks.is_empty() {
        return Err(AgentError::EmptySubTasks);
    }
    for (index, sub_task) in sub_tasks.iter().enumerate() {
        if sub_task.intent.trim().is_empty() {
            return Err(AgentError::MalformedSubTask {
                index,
                reason: "intent is empty".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
