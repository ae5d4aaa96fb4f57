//! Kernel error types.
//!
//! Three error families live here because every other crate needs them:
//!
//! - [`KernelError`] -- misuse of kernel APIs (registry conflicts).
//! - [`CallError`] -- a single outbound call failed; carries the
//!   machine-readable code the retry classifier inspects.
//! - [`SkillError`] -- a skill handler failed; its `Display` output is the
//!   user-facing `error_detail` of a failed sub-task.

/// Unified error type for kernel APIs.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A handler is already registered for this intent.
    #[error("intent already registered: {intent}")]
    DuplicateIntent { intent: String },

    /// An intent name was empty or whitespace.
    #[error("intent name must not be empty")]
    EmptyIntent,
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;

// ---------------------------------------------------------------------------
// Call errors
// ---------------------------------------------------------------------------

/// Failure of one outbound call attempt.
///
/// The variants mirror what a transport can tell us: an HTTP status, a
/// timeout marker, or a lower-level transport failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The remote service answered with a non-success status.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    /// The call did not complete within its time limit.
    #[error("timed out: {message}")]
    Timeout { message: String },

    /// Connection refused, reset, DNS failure and similar.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The service answered but the body could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl CallError {
    /// Shorthand for an HTTP status failure.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Shorthand for a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// HTTP status code, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Plain-language description suitable for end users.  Never includes
    /// status codes or transport internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Http { status, .. } if *status == 401 || *status == 403 => {
                "access was denied"
            }
            Self::Http { status, .. } if *status == 404 => "the requested item was not found",
            Self::Http { status, .. } if *status == 429 => "too many requests were made",
            Self::Http { status, .. } if *status < 500 => "the request was rejected",
            Self::Http { .. } => "the service reported an internal problem",
            Self::Timeout { .. } => "the service did not respond in time",
            Self::Transport { .. } => "the service could not be reached",
            Self::InvalidResponse { .. } => "the service returned an unexpected response",
        }
    }
}

// ---------------------------------------------------------------------------
// Skill errors
// ---------------------------------------------------------------------------

/// Failure raised by a skill handler.
///
/// The `Display` text becomes the `error_detail` shown to users, so raw
/// transport detail is kept out of it; handlers log that separately.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// Required parameters were missing or had the wrong type.
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// The handler needs the result of an earlier sub-task that is absent.
    #[error("requires the result of `{intent}`, which is not available")]
    MissingContext { intent: String },

    /// An earlier sub-task's result does not have the expected shape.
    #[error("the result of `{intent}` has an unexpected shape: {reason}")]
    ContextShape { intent: String, reason: String },

    /// A downstream service call failed (after retries, if any applied).
    #[error("{service}: {}", .source.user_message())]
    Service {
        service: String,
        #[source]
        source: CallError,
    },

    /// The handler is registered but lacks configuration (e.g. credentials).
    #[error("{service} is not configured")]
    NotConfigured { service: String },

    /// Any other handler-level failure.
    #[error("{0}")]
    Failed(String),
}

impl SkillError {
    /// Wrap a call failure for the named service.
    pub fn service(service: impl Into<String>, source: CallError) -> Self {
        Self::Service {
            service: service.into(),
            source,
        }
    }

    /// Shorthand for a parameter validation failure.
    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            reason: reason.into(),
        }
    }
}
