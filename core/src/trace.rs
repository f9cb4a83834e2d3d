//! Request-scoped trace context.
//!
//! A [`RequestSpan`] carries a correlation identity and a terminal status
//! across the publish side of the pipeline. It is an explicit value passed
//! by `&mut` from the handler into the publisher, never ambient
//! thread-local state, so concurrent requests cannot observe each other's
//! spans and tests need no global setup.
//!
//! The correlation identity travels with the published envelope so the
//! consume-side processing can be stitched to the originating request even
//! though the two run on independent tasks.
//!
//! Spans export on drop: when the request ends, the span emits a structured
//! `tracing` event with its name, correlation ID, and terminal status. The
//! tracing subscriber is the sink; this module only produces spans.

use uuid::Uuid;

/// Terminal status of a request span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanStatus {
    /// No terminal status recorded yet.
    Unset,
    /// The traced operation completed successfully.
    Ok,
    /// The traced operation failed, with a reason.
    Error(String),
}

/// A per-request tracing context.
///
/// Created at the start of the create path, renamed when the generic
/// handler specializes, finished exactly once by the publisher, and
/// exported when the request ends (on drop).
///
/// Spans are never shared across requests. Finishing a span twice is a
/// caller bug; the first terminal status wins and later calls are ignored.
///
/// # Examples
///
/// ```
/// use todo_pipeline_core::trace::{RequestSpan, SpanStatus};
///
/// let mut span = RequestSpan::start("POST /todo");
/// span.rename("todo.create");
/// span.finish_ok();
/// assert_eq!(*span.status(), SpanStatus::Ok);
/// ```
#[derive(Debug)]
pub struct RequestSpan {
    name: String,
    correlation_id: Uuid,
    status: SpanStatus,
}

impl RequestSpan {
    /// Begins a new span with a fresh correlation identity.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self::with_correlation_id(name, Uuid::new_v4())
    }

    /// Begins a new span adopting an existing correlation identity,
    /// e.g. one taken from an inbound `X-Correlation-ID` header or a
    /// consumed envelope.
    #[must_use]
    pub fn with_correlation_id(name: impl Into<String>, correlation_id: Uuid) -> Self {
        Self {
            name: name.into(),
            correlation_id,
            status: SpanStatus::Unset,
        }
    }

    /// Updates the human-readable operation label.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Records a successful terminal status.
    ///
    /// If a terminal status was already recorded, this call is ignored.
    pub fn finish_ok(&mut self) {
        if self.status == SpanStatus::Unset {
            self.status = SpanStatus::Ok;
        }
    }

    /// Records a failed terminal status with a reason.
    ///
    /// If a terminal status was already recorded, this call is ignored.
    pub fn finish_error(&mut self, reason: impl Into<String>) {
        if self.status == SpanStatus::Unset {
            self.status = SpanStatus::Error(reason.into());
        }
    }

    /// The correlation identity carried into published envelopes.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// The current operation label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The terminal status recorded so far.
    #[must_use]
    pub const fn status(&self) -> &SpanStatus {
        &self.status
    }
}

impl Drop for RequestSpan {
    fn drop(&mut self) {
        match &self.status {
            SpanStatus::Ok => tracing::info!(
                span_name = %self.name,
                correlation_id = %self.correlation_id,
                status = "ok",
                "request span finished"
            ),
            SpanStatus::Error(reason) => tracing::error!(
                span_name = %self.name,
                correlation_id = %self.correlation_id,
                status = "error",
                reason = %reason,
                "request span finished"
            ),
            SpanStatus::Unset => tracing::warn!(
                span_name = %self.name,
                correlation_id = %self.correlation_id,
                status = "unset",
                "request span dropped without terminal status"
            ),
        }
    }
}
