//! Route registration.

use crate::handlers::{create_todo, delete_todo, find_todo, health_check, list_todos, update_todo};
use crate::middleware::track_correlation_id;
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

/// Build the application router.
///
/// Registers the todo resource and the health endpoint, and layers
/// correlation-ID tracking over everything.
#[must_use]
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/todo", post(create_todo).get(list_todos))
        .route(
            "/todo/:id",
            get(find_todo).put(update_todo).delete(delete_todo),
        )
        .route("/health", get(health_check))
        .layer(from_fn(track_correlation_id))
        .with_state(state)
}
