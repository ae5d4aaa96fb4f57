//! taskweave kernel.
//!
//! Foundational pieces of the complex-task orchestration engine:
//!
//! - **[`types`]** -- Sub-task specifications and per-sub-task outcomes.
//! - **[`context`]** -- The per-run, intent-keyed [`ExecutionContext`].
//! - **[`retry`]** -- The resilient call executor: bounded retries with
//!   linear backoff and retryable/fatal error classification.
//! - **[`registry`]** -- The immutable intent-to-handler table and the
//!   [`SkillHandler`] trait every skill implements.
//! - **[`error`]** -- Kernel, call and skill error types via [`thiserror`].
//!
//! All public types are `Send + Sync` and designed for use within a
//! multi-threaded tokio runtime.

pub mod context;
pub mod error;
pub mod registry;
pub mod retry;
pub mod types;

// Re-export the most commonly used types at the crate root for convenience.
pub use context::ExecutionContext;
pub use error::{CallError, KernelError, Result, SkillError};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder, SkillHandler, SkillOutput};
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryClassifier, RetryPolicy, default_retryable,
    execute, retryable_with_statuses,
};
pub use types::{OutcomeStatus, Parameters, SubTaskOutcome, SubTaskSpec};
