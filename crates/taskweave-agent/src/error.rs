//! Agent error types.
//!
//! [`AgentError`] is reserved for conditions that make a call itself
//! invalid: structural problems with the sub-task list, unparseable NLU
//! output, bad configuration.  Per-sub-task failures are never errors at
//! this level; they are captured as data in the outcome log.

/// Unified error type for the agent crate.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- Structural errors ---------------------------------------------------
    /// `run` was called without any sub-tasks.
    #[error("sub-task list is empty")]
    EmptySubTasks,

    /// A sub-task in the list is malformed.
    #[error("sub-task {index} is malformed: {reason}")]
    MalformedSubTask { index: usize, reason: String },

    // -- NLU -----------------------------------------------------------------
    /// The NLU response could not be interpreted.
    #[error("nlu response parse error: {reason}")]
    NluParse { reason: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    Config { reason: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // -- Upstream crate errors -----------------------------------------------
    /// An error propagated from the kernel crate.
    #[error("kernel error: {0}")]
    Kernel(#[from] taskweave_kernel::KernelError),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;
