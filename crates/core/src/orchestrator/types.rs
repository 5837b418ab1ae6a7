//! Orchestrator request and error types.

use thiserror::Error;

use crate::delivery::SinkKind;
use crate::task::{FailureKind, TaskError};

/// Where a submission came from, for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitSource {
    Api,
    Scheduler,
    Bot,
}

impl SubmitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitSource::Api => "api",
            SubmitSource::Scheduler => "scheduler",
            SubmitSource::Bot => "bot",
        }
    }
}

/// Request to run one idea through the pipeline.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub idea_text: String,
    /// Stored idea this text came from, when applicable.
    pub idea_id: Option<String>,
    pub targets: Vec<SinkKind>,
    pub source: SubmitSource,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("cannot {operation} task {task_id}: current state is {current_state}")]
    InvalidState {
        task_id: String,
        current_state: String,
        operation: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Stable error kind tag exposed over the API.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "validation_error",
            OrchestratorError::NotFound(_) => "not_found",
            OrchestratorError::InvalidState { .. } => "invalid_state",
            OrchestratorError::Internal(_) => "internal_error",
        }
    }
}

impl From<TaskError> for OrchestratorError {
    fn from(error: TaskError) -> Self {
        match error {
            TaskError::NotFound(id) => OrchestratorError::NotFound(id),
            TaskError::InvalidState {
                task_id,
                current_state,
                operation,
            } => OrchestratorError::InvalidState {
                task_id,
                current_state,
                operation,
            },
            TaskError::Database(message) => OrchestratorError::Internal(message),
        }
    }
}

/// Terminal failure of a pipeline run, stored on the task.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "cancelled by request")
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::InternalError, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            OrchestratorError::Validation("x".to_string()).kind(),
            "validation_error"
        );
        assert_eq!(
            OrchestratorError::NotFound("x".to_string()).kind(),
            "not_found"
        );
        assert_eq!(
            OrchestratorError::Internal("x".to_string()).kind(),
            "internal_error"
        );
    }

    #[test]
    fn test_task_error_conversion() {
        let error: OrchestratorError = TaskError::NotFound("t-1".to_string()).into();
        assert!(matches!(error, OrchestratorError::NotFound(_)));

        let error: OrchestratorError = TaskError::Database("disk".to_string()).into();
        assert!(matches!(error, OrchestratorError::Internal(_)));
    }
}
