//! Account pool API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use reelforge_core::{AccountSnapshot, PoolError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccountErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ListAccountsResponse {
    pub accounts: Vec<AccountSnapshot>,
}

/// List all accounts with their pool state
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<ListAccountsResponse> {
    Json(ListAccountsResponse {
        accounts: state.orchestrator().pool().snapshot(),
    })
}

/// Manually reset an account, bringing a disabled one back into rotation
pub async fn reset_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListAccountsResponse>, impl IntoResponse> {
    match state.orchestrator().pool().reset(&id) {
        Ok(()) => Ok(Json(ListAccountsResponse {
            accounts: state.orchestrator().pool().snapshot(),
        })),
        Err(e @ PoolError::UnknownAccount(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(AccountErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AccountErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
