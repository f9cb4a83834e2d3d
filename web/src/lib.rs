//! Axum HTTP layer for the todo ingestion pipeline.
//!
//! This crate terminates the synchronous interface. The create path is the
//! interesting one:
//!
//! 1. **Parse** the body into a typed draft (structural failure answers
//!    406 and never reaches the publisher)
//! 2. **Seed** an explicit request span from the correlation ID
//! 3. **Publish** the command to the message log
//! 4. **Answer** 201 with the correlation token; persistence has not
//!    happened yet and no identity exists
//!
//! Read, update, and delete are plain request/response against the
//! persistence service.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use todo_pipeline_core::CommandPublisher;
//! use todo_pipeline_web::{AppState, routes};
//!
//! let publisher = Arc::new(CommandPublisher::new(log, "todo-checked"));
//! let app = routes(AppState::new(publisher, todos));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, track_correlation_id};
pub use routes::routes;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
