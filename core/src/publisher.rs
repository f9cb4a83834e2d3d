//! Publish side of the ingestion pipeline.
//!
//! The [`CommandPublisher`] is what the inbound request handler calls for
//! create requests: it encodes the draft, tags the outgoing envelope with
//! the request's correlation identity, and appends it to the create-records
//! topic. The synchronous caller gets back only "accepted by the log":
//! persistence happens later, on the subscriber side, and no identity is
//! known yet.

use crate::codec;
use crate::message_log::{Envelope, MessageLog, MessageLogError};
use crate::todo::TodoDraft;
use crate::trace::RequestSpan;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the synchronous caller of [`CommandPublisher::publish`].
#[derive(Error, Debug)]
pub enum PublishError {
    /// The draft could not be serialized; nothing was published.
    #[error("command could not be serialized: {0}")]
    Invalid(#[from] codec::CodecError),

    /// The log did not accept the write after the client's own retries;
    /// the command is lost and was NOT accepted.
    #[error("message log unavailable: {0}")]
    Unavailable(#[from] MessageLogError),
}

/// Publishes create commands to the message log.
///
/// Shared across concurrent request handlers; the underlying log client is
/// responsible for concurrent use.
#[derive(Clone)]
pub struct CommandPublisher {
    log: Arc<dyn MessageLog>,
    topic: String,
}

impl CommandPublisher {
    /// Creates a publisher for the given create-records topic.
    #[must_use]
    pub fn new(log: Arc<dyn MessageLog>, topic: impl Into<String>) -> Self {
        Self {
            log,
            topic: topic.into(),
        }
    }

    /// The topic this publisher appends to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Validate, serialize, and publish a create command.
    ///
    /// Exactly one envelope is appended per successful call. The call
    /// awaits the log's durability acknowledgment (the write being
    /// accepted), never consumer-side processing; the choice trades a
    /// little latency for knowing the command is durable. No retry loop
    /// lives here; the log client owns retries, and an error means they
    /// are exhausted.
    ///
    /// The span is finished exactly once: ok on success, error on either
    /// failure path. A caller that times out mid-publish must treat the
    /// outcome as ambiguous, since the log may have stored the record.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] if the draft cannot be serialized;
    ///   nothing reaches the log.
    /// - [`PublishError::Unavailable`] if the log rejected or could not
    ///   accept the write; the caller must be told the command was not
    ///   accepted.
    pub async fn publish(
        &self,
        draft: &TodoDraft,
        span: &mut RequestSpan,
    ) -> Result<(), PublishError> {
        let payload = match codec::encode(draft) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    correlation_id = %span.correlation_id(),
                    error = %e,
                    "failed to encode command"
                );
                span.finish_error("failed to encode command");
                return Err(PublishError::Invalid(e));
            }
        };

        let envelope = Envelope::new(payload, span.correlation_id());

        match self.log.publish(&self.topic, &envelope).await {
            Ok(()) => {
                tracing::debug!(
                    topic = %self.topic,
                    correlation_id = %span.correlation_id(),
                    "command published"
                );
                span.finish_ok();
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    topic = %self.topic,
                    correlation_id = %span.correlation_id(),
                    error = %e,
                    "failed to publish command"
                );
                span.finish_error("failed to publish command");
                Err(PublishError::Unavailable(e))
            }
        }
    }
}
