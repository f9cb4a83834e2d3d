//! Persistence service contract.
//!
//! [`TodoService`] is the domain store the pipeline writes into. It is an
//! external collaborator: this crate consumes the interface and makes no
//! assumption about the storage engine behind it.

use crate::todo::{Todo, TodoDraft, TodoId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from the persistence service.
#[derive(Error, Debug)]
pub enum TodoServiceError {
    /// The store failed in a way that may succeed on retry.
    ///
    /// The subscriber maps this to "do not acknowledge", so the record is
    /// redelivered. A permanently failing store turns this into unbounded
    /// redelivery; dead-letter routing is an operational concern outside
    /// this pipeline.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// The domain store for todos.
///
/// # Idempotency
///
/// The pipeline delivers create commands at least once: after a crash or a
/// transient failure the same logical command is redelivered and
/// [`create`](Self::create) is invoked again. Implementations must be safe
/// under repeated invocation for the same logical command. This is an
/// assumption placed on the implementor, not something the pipeline can
/// enforce; stores that cannot guarantee it may produce duplicate records.
///
/// # Dyn Compatibility
///
/// `create` returns an explicit `Pin<Box<dyn Future>>` so the trait can be
/// shared as `Arc<dyn TodoService>` between the subscriber loop and the
/// HTTP handlers.
pub trait TodoService: Send + Sync {
    /// Persist a draft, assigning it an identity.
    ///
    /// # Errors
    ///
    /// Returns [`TodoServiceError::Unavailable`] on transient failure; the
    /// caller decides whether to retry (the subscriber does so by
    /// withholding acknowledgment).
    fn create(
        &self,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = Result<Todo, TodoServiceError>> + Send + '_>>;

    /// All persisted todos.
    fn get_all(&self) -> Pin<Box<dyn Future<Output = Vec<Todo>> + Send + '_>>;

    /// Look up a todo by identity.
    fn find_by_id(&self, id: TodoId) -> Pin<Box<dyn Future<Output = Option<Todo>> + Send + '_>>;

    /// Replace the draft fields of an existing todo.
    ///
    /// Returns `false` if no todo with that identity exists.
    fn update(
        &self,
        id: TodoId,
        draft: TodoDraft,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Delete a todo by identity.
    ///
    /// Returns `false` if no todo with that identity exists.
    fn delete(&self, id: TodoId) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}
