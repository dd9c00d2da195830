//! API endpoints.

pub mod todo;

use std::sync::Arc;

use axum::{Router, routing::get};
use task_store::TaskStore;

use crate::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router<S: TaskStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Todo endpoints
        .route("/todos", get(todo::list_todos).post(todo::create_todo))
        .route("/todos/due-soon", get(todo::list_due_soon))
        .route(
            "/todos/{id}",
            get(todo::get_todo)
                .put(todo::update_todo)
                .delete(todo::delete_todo),
        )
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
