//! Task API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use reelforge_core::{
    OrchestratorError, SinkKind, SubmitRequest, SubmitSource, Task, TaskFilter, TaskState,
};

use crate::state::AppState;

/// Maximum allowed limit for task queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for task queries
const DEFAULT_LIMIT: i64 = 100;

/// Request body for submitting a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    /// Freeform idea text handed to the screenwriter
    pub idea_text: String,
    /// Stored idea this text came from, when applicable
    pub idea_id: Option<String>,
    /// Delivery sinks; defaults to all supported sinks
    pub targets: Option<Vec<SinkKind>>,
}

/// Query parameters for listing tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    /// Filter by state type
    pub state: Option<String>,
    /// Maximum number of tasks to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Query parameters for deleting a task
#[derive(Debug, Deserialize)]
pub struct DeleteTaskParams {
    /// Delete even when the task is not terminal
    #[serde(default)]
    pub force: bool,
}

/// Response for task operations
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub created_at: String,
    pub idea_text: String,
    pub idea_id: Option<String>,
    pub targets: Vec<SinkKind>,
    pub state: TaskState,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            created_at: task.created_at.to_rfc3339(),
            idea_text: task.idea_text,
            idea_id: task.idea_id,
            targets: task.targets,
            state: task.state,
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing tasks
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response with a stable kind tag
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

pub fn error_response(error: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error.kind() {
        "validation_error" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        "invalid_state" => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            kind: error.kind().to_string(),
        }),
    )
}

/// Submit a new task
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<TaskResponse>), (StatusCode, Json<ErrorResponse>)> {
    let request = SubmitRequest {
        idea_text: body.idea_text,
        idea_id: body.idea_id,
        targets: body
            .targets
            .unwrap_or_else(|| vec![SinkKind::Telegram, SinkKind::Tiktok]),
        source: SubmitSource::Api,
    };

    let task_id = state
        .orchestrator()
        .submit(request)
        .map_err(error_response)?;
    let task = state
        .orchestrator()
        .get_status(&task_id)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Get a task by ID
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, impl IntoResponse> {
    state
        .orchestrator()
        .get_status(&id)
        .map(|task| Json(TaskResponse::from(task)))
        .map_err(error_response)
}

/// List tasks with optional filters
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<ListTasksResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = TaskFilter::new().with_limit(limit).with_offset(offset);
    if let Some(ref state_filter) = params.state {
        filter = filter.with_state(state_filter);
    }

    let tasks = state
        .orchestrator()
        .list_tasks(&filter)
        .map_err(error_response)?;

    let count_filter = TaskFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state
        .orchestrator()
        .count_tasks(&count_filter)
        .map_err(error_response)?;

    Ok(Json(ListTasksResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Request cooperative cancellation of a task
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, impl IntoResponse> {
    state
        .orchestrator()
        .cancel(&id)
        .map(|task| Json(TaskResponse::from(task)))
        .map_err(error_response)
}

/// Delete a task record
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteTaskParams>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .orchestrator()
        .delete(&id, params.force)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}
