//! In-memory todo store.
//!
//! The reference [`TodoService`] implementation shipped with the server: a
//! list behind a mutex. Good enough for a single instance; swapping in a
//! database-backed service means implementing the same trait and changing
//! one line in `main`.

use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use todo_pipeline_core::service::{TodoService, TodoServiceError};
use todo_pipeline_core::todo::{Todo, TodoDraft, TodoId};

/// List-backed todo store.
///
/// Create is trivially repeatable but NOT idempotent per logical command:
/// a redelivered create command yields a second record with a fresh
/// identity. That is the documented trade-off of pairing at-least-once
/// delivery with this store; a deduplicating store would use the
/// envelope's correlation token as a natural idempotency key.
#[derive(Clone, Default)]
pub struct ListTodoStore {
    todos: Arc<Mutex<Vec<Todo>>>,
}

impl ListTodoStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoService for ListTodoStore {
    fn create(
        &self,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = Result<Todo, TodoServiceError>> + Send + '_>> {
        Box::pin(async move {
            let todo = Todo::from_draft(TodoId::new(), draft, Utc::now());
            self.todos.lock().await.push(todo.clone());
            Ok(todo)
        })
    }

    fn get_all(&self) -> Pin<Box<dyn Future<Output = Vec<Todo>> + Send + '_>> {
        Box::pin(async move { self.todos.lock().await.clone() })
    }

    fn find_by_id(&self, id: TodoId) -> Pin<Box<dyn Future<Output = Option<Todo>> + Send + '_>> {
        Box::pin(async move {
            self.todos
                .lock()
                .await
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
            let mut todos = self.todos.lock().await;
            match todos.iter_mut().find(|todo| todo.id == id) {
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
            let mut todos = self.todos.lock().await;
            let before = todos.len();
            todos.retain(|todo| todo.id != id);
            todos.len() < before
        })
    }
}
