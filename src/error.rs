//! Error types for the task orchestration layer.
//!
//! One crate-wide [`Error`] enum covers the whole taxonomy: caller/config
//! errors that are never retried, vendor-reported request failures, terminal
//! task failures, and the polling engine's own give-up conditions. Adapters
//! never swallow a vendor error; they re-shape it into one of these variants
//! and preserve the raw vendor payload for debugging.

use crate::types::{ErrorCode, Provider, Task, TaskKind};

/// Unified error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The adapter does not implement the requested task kind.
    /// Caller/configuration error; never retried.
    #[error("provider {provider} does not support operation {kind}")]
    UnsupportedOperation { provider: Provider, kind: TaskKind },

    /// Image-input classification failed. Caller error; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The vendor rejected a creation or status call.
    ///
    /// Not automatically retried on the creation path; subject to the polling
    /// engine's transient-error budget when raised by a status fetch.
    #[error("api error {code}: {message}")]
    ApiError {
        /// Normalized vendor error code.
        code: String,
        message: String,
        /// HTTP status of the response, when the failure was HTTP-level.
        http_status: Option<u16>,
        /// Raw vendor payload, preserved for debugging.
        details: Option<serde_json::Value>,
    },

    /// The vendor executed the task and reported a terminal failure.
    /// The task is done; never retried.
    #[error("task {} failed with {code}: {message}", .task.id)]
    TaskFailed {
        code: ErrorCode,
        message: String,
        task: Box<Task>,
    },

    /// The vendor reports the task as canceled.
    #[error("task {} was canceled", .task.id)]
    TaskCanceled { task: Box<Task> },

    /// Polling exceeded its wall-clock budget while the task was still
    /// non-terminal. The task may still complete vendor-side.
    #[error("polling task {task_id} timed out after {elapsed_ms}ms (budget {timeout_ms}ms)")]
    Timeout {
        task_id: String,
        timeout_ms: u64,
        elapsed_ms: u64,
    },

    /// Too many consecutive transient status-fetch failures. Distinct from
    /// [`Error::Timeout`]: this means the vendor is unreachable, not slow.
    #[error("polling task {task_id} gave up after {attempts} consecutive fetch errors: {last_error}")]
    MaxRetriesExceeded {
        task_id: String,
        attempts: u32,
        last_error: String,
    },

    /// The caller cancelled the poll via its [`CancelHandle`].
    ///
    /// [`CancelHandle`]: crate::utils::cancel::CancelHandle
    #[error("polling task {task_id} was stopped by the caller")]
    PollAborted { task_id: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("http error: {0}")]
    Http(String),

    /// The vendor response could not be decoded.
    #[error("json error: {0}")]
    Json(String),
}

/// Coarse error classification, mainly for logging and UI branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller or configuration mistake; retrying cannot help.
    Caller,
    /// The vendor rejected a request.
    Api,
    /// The task itself reached a terminal failure state.
    Task,
    /// The polling engine gave up.
    Polling,
    /// Transport or decoding failure.
    Transport,
}

impl Error {
    /// Shorthand for an [`Error::ApiError`] without HTTP context.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            code: code.into(),
            message: message.into(),
            http_status: None,
            details: None,
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedOperation { .. } | Self::InvalidInput(_) => ErrorCategory::Caller,
            Self::ApiError { .. } => ErrorCategory::Api,
            Self::TaskFailed { .. } | Self::TaskCanceled { .. } => ErrorCategory::Task,
            Self::Timeout { .. } | Self::MaxRetriesExceeded { .. } | Self::PollAborted { .. } => {
                ErrorCategory::Polling
            }
            Self::Http(_) | Self::Json(_) => ErrorCategory::Transport,
        }
    }

    /// Whether a status-fetch failure with this error counts against the
    /// polling engine's consecutive-error budget.
    ///
    /// Only transport-level and vendor-request failures are transient;
    /// caller errors and terminal task outcomes propagate immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Api | ErrorCategory::Transport
        )
    }

    /// HTTP status associated with this error, when there is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::ApiError { http_status, .. } => *http_status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
