//! Application state for Axum handlers.

use std::sync::Arc;
use todo_pipeline_core::publisher::CommandPublisher;
use todo_pipeline_core::service::TodoService;

/// Application state shared across all HTTP handlers.
///
/// Holds the two collaborators the routes need: the command publisher for
/// the asynchronous create path, and the persistence service for the
/// direct read/update/delete paths. Both are cheaply cloneable handles;
/// the state itself is cloned per request by Axum.
#[derive(Clone)]
pub struct AppState {
    /// Publisher for the create-records topic.
    pub publisher: Arc<CommandPublisher>,
    /// The domain store backing the direct routes.
    pub todos: Arc<dyn TodoService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(publisher: Arc<CommandPublisher>, todos: Arc<dyn TodoService>) -> Self {
        Self { publisher, todos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Ensure AppState implements Clone (required for Axum)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
