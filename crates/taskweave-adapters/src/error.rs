//! Adapter error types.
//!
//! [`AdapterError`] only covers setting adapters up.  Failures while a
//! skill runs are reported as [`taskweave_kernel::SkillError`] so they end
//! up in the outcome log instead of aborting anything.

/// Unified error type for taskweave adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {reason}")]
    Client { reason: String },

    /// A configured endpoint is not a usable URL.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Registering a skill with the handler registry failed.
    #[error("registry error: {0}")]
    Registry(#[from] taskweave_kernel::KernelError),
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
