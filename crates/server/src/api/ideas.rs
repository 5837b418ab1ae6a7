//! Idea API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use reelforge_core::{CreateIdeaRequest, Idea, IdeaError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IdeaErrorResponse {
    pub error: String,
}

fn error_response(error: IdeaError) -> (StatusCode, Json<IdeaErrorResponse>) {
    let status = match error {
        IdeaError::NotFound(_) => StatusCode::NOT_FOUND,
        IdeaError::Invalid(_) => StatusCode::BAD_REQUEST,
        IdeaError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(IdeaErrorResponse {
            error: error.to_string(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ListIdeasResponse {
    pub ideas: Vec<Idea>,
    pub total: usize,
}

/// Store a new idea
pub async fn create_idea(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<Idea>), impl IntoResponse> {
    state
        .idea_store()
        .create(request)
        .map(|idea| (StatusCode::CREATED, Json(idea)))
        .map_err(error_response)
}

/// List all ideas, newest-first
pub async fn list_ideas(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListIdeasResponse>, impl IntoResponse> {
    state
        .idea_store()
        .list()
        .map(|ideas| {
            let total = ideas.len();
            Json(ListIdeasResponse { ideas, total })
        })
        .map_err(error_response)
}

/// Get an idea by ID
pub async fn get_idea(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Idea>, impl IntoResponse> {
    match state.idea_store().get(&id) {
        Ok(Some(idea)) => Ok(Json(idea)),
        Ok(None) => Err(error_response(IdeaError::NotFound(id))),
        Err(e) => Err(error_response(e)),
    }
}

/// Delete an idea
pub async fn delete_idea(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .idea_store()
        .delete(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}
