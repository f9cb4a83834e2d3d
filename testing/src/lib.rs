//! # Todo Pipeline Testing
//!
//! Testing utilities for the todo ingestion pipeline.
//!
//! This crate provides in-memory implementations of the pipeline's external
//! collaborators, faithful enough to exercise the delivery and
//! acknowledgment semantics the production components rely on:
//!
//! - [`InMemoryMessageLog`]: an in-memory message log with committed
//!   offsets and redelivery of unacknowledged records
//! - [`InMemoryTodoService`]: an in-memory persistence service with
//!   transient-failure injection and call recording
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use todo_pipeline_core::{CommandPublisher, RequestSpan, TodoDraft};
//! use todo_pipeline_testing::InMemoryMessageLog;
//!
//! # tokio_test::block_on(async {
//! let log = Arc::new(InMemoryMessageLog::new());
//! let publisher = CommandPublisher::new(log.clone(), "todo-checked");
//!
//! let mut span = RequestSpan::start("todo.create");
//! publisher
//!     .publish(&TodoDraft::new("buy milk".to_string()), &mut span)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(log.published("todo-checked").await.len(), 1);
//! # });
//! ```

pub mod message_log;
pub mod service;

pub use message_log::InMemoryMessageLog;
pub use service::InMemoryTodoService;

/// Initialize a tracing subscriber for tests.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call from multiple
/// tests; only the first call installs a subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}
