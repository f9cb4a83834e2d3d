//! In-memory persistence service.
//!
//! [`InMemoryTodoService`] backs the non-create routes and the subscriber
//! in tests (and in the demo server). It records every `create` call and
//! can be told to fail transiently, which is how the redelivery tests
//! exercise the acknowledgment discipline.

use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use todo_pipeline_core::service::{TodoService, TodoServiceError};
use todo_pipeline_core::todo::{Todo, TodoDraft, TodoId};

#[derive(Default)]
struct ServiceState {
    todos: Vec<Todo>,
    create_calls: Vec<TodoDraft>,
    fail_next_creates: usize,
}

/// In-memory [`TodoService`] with failure injection.
///
/// Identity assignment happens here, at create time, never earlier in the
/// pipeline. Each accepted create appends a new record; the at-least-once
/// idempotency assumption is the caller's to verify against the recorded
/// [`create_calls`](Self::create_calls).
///
/// # Examples
///
/// ```
/// use todo_pipeline_core::service::TodoService;
/// use todo_pipeline_core::todo::TodoDraft;
/// use todo_pipeline_testing::InMemoryTodoService;
///
/// # tokio_test::block_on(async {
/// let service = InMemoryTodoService::new();
/// let todo = service.create(TodoDraft::new("buy milk".to_string())).await.unwrap();
/// assert_eq!(service.find_by_id(todo.id).await.unwrap().title, "buy milk");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryTodoService {
    state: Arc<Mutex<ServiceState>>,
}

impl InMemoryTodoService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` create calls fail with
    /// [`TodoServiceError::Unavailable`]. The calls are still recorded.
    pub async fn fail_next_creates(&self, n: usize) {
        self.state.lock().await.fail_next_creates = n;
    }

    /// Every draft `create` was invoked with, in call order, including
    /// calls that failed.
    pub async fn create_calls(&self) -> Vec<TodoDraft> {
        self.state.lock().await.create_calls.clone()
    }

    /// Number of persisted todos.
    pub async fn len(&self) -> usize {
        self.state.lock().await.todos.len()
    }

    /// Whether no todos are persisted.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.todos.is_empty()
    }
}

impl TodoService for InMemoryTodoService {
    fn create(
        &self,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = Result<Todo, TodoServiceError>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.create_calls.push(draft.clone());

            if state.fail_next_creates > 0 {
                state.fail_next_creates -= 1;
                return Err(TodoServiceError::Unavailable(
                    "injected failure".to_string(),
                ));
            }

            let todo = Todo::from_draft(TodoId::new(), draft, Utc::now());
            state.todos.push(todo.clone());
            Ok(todo)
        })
    }

    fn get_all(&self) -> Pin<Box<dyn Future<Output = Vec<Todo>> + Send + '_>> {
        Box::pin(async move { self.state.lock().await.todos.clone() })
    }

    fn find_by_id(&self, id: TodoId) -> Pin<Box<dyn Future<Output = Option<Todo>> + Send + '_>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .todos
                .iter()
                .find(|todo| todo.id == id)
                .cloned()
        })
    }

    fn update(
        &self,
        id: TodoId,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            match state.todos.iter_mut().find(|todo| todo.id == id) {
                Some(todo) => {
                    todo.title = draft.title;
                    todo.description = draft.description;
                    todo.done = draft.done;
                    true
                }
                None => false,
            }
        })
    }

    fn delete(&self, id: TodoId) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let before = state.todos.len();
            state.todos.retain(|todo| todo.id != id);
            state.todos.len() < before
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_identity_and_persists() {
        let service = InMemoryTodoService::new();
        let draft = TodoDraft::new("buy milk".to_string());

        let todo = service.create(draft.clone()).await.unwrap();

        assert_eq!(todo.title, draft.title);
        assert_eq!(service.len().await, 1);
        assert_eq!(service.create_calls().await, vec![draft]);
    }

    #[tokio::test]
    async fn injected_failure_is_transient_and_recorded() {
        let service = InMemoryTodoService::new();
        service.fail_next_creates(1).await;
        let draft = TodoDraft::new("buy milk".to_string());

        let result = service.create(draft.clone()).await;
        assert!(matches!(result, Err(TodoServiceError::Unavailable(_))));
        assert!(service.is_empty().await);

        service.create(draft.clone()).await.unwrap();
        assert_eq!(service.len().await, 1);
        assert_eq!(service.create_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let service = InMemoryTodoService::new();
        let absent = TodoId::new();

        assert!(!service.update(absent, TodoDraft::new("x".to_string())).await);
        assert!(!service.delete(absent).await);

        let todo = service
            .create(TodoDraft::new("before".to_string()))
            .await
            .unwrap();
        assert!(
            service
                .update(todo.id, TodoDraft::new("after".to_string()))
                .await
        );
        assert_eq!(service.find_by_id(todo.id).await.unwrap().title, "after");
        assert!(service.delete(todo.id).await);
        assert!(service.is_empty().await);
    }
}
