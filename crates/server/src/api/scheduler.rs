//! Scheduler API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use reelforge_core::{SchedulerConfig, SchedulerError, SchedulerStatus};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SchedulerErrorResponse {
    pub error: String,
}

fn error_response(error: SchedulerError) -> (StatusCode, Json<SchedulerErrorResponse>) {
    let status = match error {
        SchedulerError::Misconfiguration(_) => StatusCode::BAD_REQUEST,
        SchedulerError::Store(_) | SchedulerError::Submit(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(SchedulerErrorResponse {
            error: error.to_string(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct RunNowResponse {
    /// Id of the submitted task; absent when no idea was available.
    pub task_id: Option<String>,
}

/// Get the current schedule and run accounting
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler().status())
}

/// Replace the schedule
pub async fn configure(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SchedulerConfig>,
) -> Result<Json<SchedulerStatus>, impl IntoResponse> {
    state
        .scheduler()
        .configure(config)
        .map(Json)
        .map_err(error_response)
}

/// Enable the schedule
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchedulerStatus>, impl IntoResponse> {
    state.scheduler().start().map(Json).map_err(error_response)
}

/// Disable the schedule
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchedulerStatus>, impl IntoResponse> {
    state.scheduler().stop().map(Json).map_err(error_response)
}

/// Fire the schedule immediately, regardless of the enabled flag
pub async fn run_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunNowResponse>, impl IntoResponse> {
    state
        .scheduler()
        .run_now()
        .map(|task_id| Json(RunNowResponse { task_id }))
        .map_err(error_response)
}
