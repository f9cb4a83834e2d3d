//! Consume side of the ingestion pipeline.
//!
//! The [`CommandSubscriber`] is a long-lived task, decoupled in time and
//! failure domain from the request handlers. It consumes the create-records
//! topic, decodes each delivery, persists the draft through the
//! [`TodoService`](crate::service::TodoService), and acknowledges the
//! record only after persistence succeeded.
//!
//! Per-record state machine:
//!
//! ```text
//! received → decoded → persisted   → acknowledged
//! received → decode-failed         → acknowledged   (drop; cannot ever succeed)
//! received → decoded → persist-failed → (not acked → redelivered → received)
//! ```
//!
//! There is no terminal "failed forever" state: a record whose persistence
//! keeps failing is redelivered indefinitely. Dead-letter routing is an
//! operational concern outside this component.

use crate::codec;
use crate::message_log::{Delivery, MessageLog, MessageLogError};
use crate::service::TodoService;
use futures::StreamExt;
use std::sync::Arc;

/// What happened to a single delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Decoded, persisted, and acknowledged.
    Persisted,
    /// Malformed payload: reported and acknowledged without persisting.
    /// Redelivery can never fix a structurally malformed record, so
    /// retrying it forever would only wedge the partition.
    DroppedMalformed,
    /// Persistence failed transiently: not acknowledged, so the log will
    /// redeliver the record.
    AwaitingRedelivery,
}

/// Consumes create commands and forwards them to the persistence service.
pub struct CommandSubscriber {
    log: Arc<dyn MessageLog>,
    topic: String,
    service: Arc<dyn TodoService>,
}

impl CommandSubscriber {
    /// Creates a subscriber for the given create-records topic.
    #[must_use]
    pub fn new(
        log: Arc<dyn MessageLog>,
        topic: impl Into<String>,
        service: Arc<dyn TodoService>,
    ) -> Self {
        Self {
            log,
            topic: topic.into(),
            service,
        }
    }

    /// Subscribe and process deliveries until the stream ends.
    ///
    /// Records are processed one at a time in delivery order, so ordering
    /// within a partition is preserved. Transport errors on the stream are
    /// logged and the loop continues; the log client handles reconnection.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::SubscriptionFailed`] if the subscription
    /// could not be established. Once subscribed, the loop only returns
    /// when the stream ends.
    pub async fn run(&self) -> Result<(), MessageLogError> {
        let mut stream = self.log.subscribe(&self.topic).await?;

        tracing::info!(topic = %self.topic, "command subscriber started");

        while let Some(result) = stream.next().await {
            match result {
                Ok(delivery) => {
                    self.process(delivery).await;
                }
                Err(e) => {
                    tracing::error!(topic = %self.topic, error = %e, "delivery stream error");
                }
            }
        }

        tracing::info!(topic = %self.topic, "command subscriber stopped");
        Ok(())
    }

    /// Process one delivery through the per-record state machine.
    ///
    /// Acknowledgment is the only signal back to the log: it is sent after
    /// successful persistence, or for malformed records that can never
    /// succeed. A commit failure after successful processing is logged and
    /// tolerated: the record may be redelivered, which the idempotency
    /// assumption on [`TodoService::create`](crate::service::TodoService::create)
    /// absorbs.
    pub async fn process(&self, delivery: Delivery) -> ProcessOutcome {
        let correlation_id = delivery.envelope.correlation_id;
        let partition = delivery.partition;
        let offset = delivery.offset;

        let draft = match codec::decode(&delivery.envelope.payload) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::error!(
                    topic = %self.topic,
                    partition,
                    offset,
                    correlation_id = %correlation_id,
                    error = %e,
                    "malformed record dropped"
                );
                Self::commit(delivery, "malformed record").await;
                return ProcessOutcome::DroppedMalformed;
            }
        };

        tracing::info!(
            topic = %self.topic,
            partition,
            offset,
            correlation_id = %correlation_id,
            title = %draft.title,
            "received create command"
        );

        match self.service.create(draft).await {
            Ok(todo) => {
                tracing::info!(
                    correlation_id = %correlation_id,
                    todo_id = %todo.id,
                    "todo persisted"
                );
                Self::commit(delivery, "persisted record").await;
                ProcessOutcome::Persisted
            }
            Err(e) => {
                // No ack: the log redelivers this record on the next poll.
                tracing::warn!(
                    topic = %self.topic,
                    partition,
                    offset,
                    correlation_id = %correlation_id,
                    error = %e,
                    "persistence failed, awaiting redelivery"
                );
                ProcessOutcome::AwaitingRedelivery
            }
        }
    }

    async fn commit(delivery: Delivery, context: &str) {
        let partition = delivery.partition;
        let offset = delivery.offset;
        if let Err(e) = delivery.ack().await {
            tracing::warn!(
                partition,
                offset,
                error = %e,
                "failed to commit offset for {context} (may be redelivered)"
            );
        }
    }
}
