//! Complex-task orchestration for taskweave.
//!
//! Takes the ordered sub-task list produced by the upstream NLU step, runs
//! each sub-task through its registered skill handler one at a time, feeds
//! earlier results forward to later handlers, and reduces the outcome log
//! into a single report.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐     ┌──────────────┐     ┌────────────┐     ┌──────────┐
//! │    NLU    │────>│ Orchestrator │────>│ Dispatcher │────>│ Handlers │
//! │  (parse)  │     │  (run loop)  │     │  (route)   │     │ (skills) │
//! └───────────┘     └──────┬───────┘     └────────────┘     └──────────┘
//!                          │
//!                   ┌──────┴───────┐
//!                   │    Report    │
//!                   │  (summarize) │
//!                   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`] -- The sequential run loop and criticality policy.
//! - [`dispatcher`] -- Routes one sub-task to its handler, normalizes the result.
//! - [`report`] -- Overall status and summary text.
//! - [`nlu`] -- Parses upstream NLU responses into requests.
//! - [`config`] -- File and environment configuration.
//! - [`error`] -- Agent error types.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod nlu;
pub mod orchestrator;
pub mod report;

// Re-export the most commonly used types at the crate root.
pub use config::{HttpConfig, OrchestratorConfig, RetryConfig, SearchConfig, TaskweaveConfig};
pub use dispatcher::{Dispatcher, HANDLER_PANICKED, UNSUPPORTED_INTENT};
pub use error::{AgentError, Result};
pub use nlu::{NluRequest, parse_nlu_response};
pub use orchestrator::{
    CriticalityPolicy, DEFAULT_NON_CRITICAL_INTENTS, Orchestrator, SequentialItem,
    SequentialRunResult,
};
pub use report::{NOTHING_EXECUTABLE, OrchestrationReport, OverallStatus, RunInfo, summarize};
