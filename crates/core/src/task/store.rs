//! Task store trait and common request/filter types.

use thiserror::Error;

use super::types::{Task, TaskState};
use crate::delivery::SinkKind;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("cannot {operation} task {task_id}: current state is {current_state}")]
    InvalidState {
        task_id: String,
        current_state: String,
        operation: String,
    },

    #[error("database error: {0}")]
    Database(String),
}

/// Request to create a new task.
#[derive(Debug, Clone)]
pub struct CreateTaskRequest {
    pub idea_text: String,
    pub idea_id: Option<String>,
    pub targets: Vec<SinkKind>,
}

/// Filter for listing tasks. Results are always newest-first.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Filter by state tag (e.g. "pending", "failed").
    pub state: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            state: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Persistent task storage.
///
/// `update_state` enforces the state machine: terminal states are
/// absorbing and transitions never move backward.
pub trait TaskStore: Send + Sync {
    fn create(&self, request: CreateTaskRequest) -> Result<Task, TaskError>;

    fn get(&self, id: &str) -> Result<Option<Task>, TaskError>;

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError>;

    fn count(&self, filter: &TaskFilter) -> Result<i64, TaskError>;

    fn update_state(&self, id: &str, new_state: TaskState) -> Result<Task, TaskError>;

    fn delete(&self, id: &str) -> Result<(), TaskError>;
}
