use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{accounts, handlers, ideas, middleware::metrics_middleware, scheduler, tasks};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Tasks
        .route("/tasks", post(tasks::create_task))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{id}", get(tasks::get_task))
        .route("/tasks/{id}", delete(tasks::delete_task))
        .route("/tasks/{id}/cancel", post(tasks::cancel_task))
        // Scheduler
        .route("/scheduler", get(scheduler::get_status))
        .route("/scheduler", put(scheduler::configure))
        .route("/scheduler/start", post(scheduler::start))
        .route("/scheduler/stop", post(scheduler::stop))
        .route("/scheduler/run-now", post(scheduler::run_now))
        // Ideas
        .route("/ideas", post(ideas::create_idea))
        .route("/ideas", get(ideas::list_ideas))
        .route("/ideas/{id}", get(ideas::get_idea))
        .route("/ideas/{id}", delete(ideas::delete_idea))
        // Accounts
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/{id}/reset", post(accounts::reset_account))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
