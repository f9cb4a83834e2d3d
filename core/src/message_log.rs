//! Message log abstraction for the asynchronous ingestion pipeline.
//!
//! This module defines the [`MessageLog`] trait: a durable, partitioned,
//! ordered append log with consumer-group offset tracking, supplied by the
//! deployment environment. Publishers append [`Envelope`]s to a named topic;
//! subscribers receive [`Delivery`] values and commit offsets explicitly.
//!
//! # Delivery Semantics
//!
//! **At-least-once** with consumer-side acknowledgment:
//! - [`MessageLog::publish`] resolves once the log has durably accepted the
//!   write. It never waits for consumers.
//! - A [`Delivery`] is acknowledged by calling [`Delivery::ack`], which
//!   advances the consumer group's committed offset past the record.
//!   A delivery dropped without acknowledgment stays eligible for
//!   redelivery on the next poll or rebalance.
//! - Ordering is guaranteed within a partition only, never across
//!   partitions.
//!
//! The acknowledgment discipline is the inverse of commit-on-receive buses:
//! here the *processor* decides when a record is done, so a crash between
//! receive and commit replays the record instead of losing it. Subscribers
//! must therefore be idempotent.
//!
//! # Implementations
//!
//! - `InMemoryMessageLog` (todo-pipeline-testing) - for tests, with real
//!   commit/redelivery semantics.
//! - `RedpandaMessageLog` (todo-pipeline-redpanda) - Kafka-compatible,
//!   for production.

use chrono::{DateTime, Utc};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during message log operations.
#[derive(Error, Debug)]
pub enum MessageLogError {
    /// Failed to connect to the log.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The log rejected or could not accept a write.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to a topic.
    #[error("subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The topic that failed to subscribe.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to commit a consumed offset.
    #[error("commit failed for topic '{topic}': {reason}")]
    CommitFailed {
        /// The topic whose offset failed to commit.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Network or transport error while consuming.
    #[error("transport error: {0}")]
    TransportError(String),
}

/// The unit appended to the message log.
///
/// An envelope wraps an opaque payload (a serialized command) together with
/// the trace correlation token of the request that produced it. The payload
/// must always decode back to a structurally valid command; a subscriber
/// that cannot decode it treats the record as malformed and drops it after
/// acknowledging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// The serialized command.
    pub payload: Vec<u8>,
    /// Correlation token linking this record to the originating request.
    pub correlation_id: Uuid,
}

impl Envelope {
    /// Creates a new envelope.
    #[must_use]
    pub const fn new(payload: Vec<u8>, correlation_id: Uuid) -> Self {
        Self {
            payload,
            correlation_id,
        }
    }
}

/// Acknowledger attached to a [`Delivery`].
///
/// Implementations commit the record's offset for the subscriber's consumer
/// group. Implementors are log clients; pipeline code only calls
/// [`Delivery::ack`].
pub trait Acknowledge: Send {
    /// Commit the delivered record's offset.
    fn ack(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send>>;
}

/// A record delivered from the log, with its metadata and acknowledger.
///
/// Ownership of the underlying record transfers to the subscriber on
/// delivery and is released only by [`Delivery::ack`]. Dropping a delivery
/// without acknowledging leaves the record eligible for redelivery.
pub struct Delivery {
    /// The envelope as published.
    pub envelope: Envelope,
    /// Partition the record was read from.
    pub partition: i32,
    /// Offset of the record within its partition.
    pub offset: i64,
    /// Log-assigned timestamp, if the log provides one.
    pub timestamp: Option<DateTime<Utc>>,
    acker: Box<dyn Acknowledge>,
}

impl Delivery {
    /// Creates a delivery. Called by log implementations.
    #[must_use]
    pub fn new(
        envelope: Envelope,
        partition: i32,
        offset: i64,
        timestamp: Option<DateTime<Utc>>,
        acker: Box<dyn Acknowledge>,
    ) -> Self {
        Self {
            envelope,
            partition,
            offset,
            timestamp,
            acker,
        }
    }

    /// Acknowledge the record, advancing the committed offset past it.
    ///
    /// This is the sole mechanism behind at-least-once delivery: call it
    /// only once processing has succeeded (or can never succeed).
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::CommitFailed`] if the offset could not be
    /// committed. The record may then be redelivered even though it was
    /// processed.
    pub async fn ack(self) -> Result<(), MessageLogError> {
        self.acker.ack().await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("envelope", &self.envelope)
            .field("partition", &self.partition)
            .field("offset", &self.offset)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Stream of deliveries from a subscription.
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery, MessageLogError>> + Send>>;

/// Trait for message log clients.
///
/// Implementations must be `Send + Sync`: one client is shared between all
/// concurrent request handlers and the subscriber loop.
///
/// # Dyn Compatibility
///
/// Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// the trait can be used as `Arc<dyn MessageLog>`.
pub trait MessageLog: Send + Sync {
    /// Append an envelope to a topic.
    ///
    /// Resolves when the log has durably accepted the write (the log's own
    /// acknowledgment), not when any consumer has processed it. Retries up
    /// to that point are the client's concern; a returned error means the
    /// client's own retry policy is exhausted.
    ///
    /// A cancelled (timed out) publish is ambiguous: the log may have
    /// durably stored the record. Callers must not interpret cancellation
    /// as "definitely not sent".
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::PublishFailed`] if the write was not
    /// accepted.
    fn publish(
        &self,
        topic: &str,
        envelope: &Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send + '_>>;

    /// Subscribe to a topic and receive a stream of deliveries.
    ///
    /// The client's consumer group determines offset tracking: all
    /// subscribers sharing a group share one committed offset per
    /// partition, so scaling out adds parallelism without duplicate
    /// processing across instances.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::SubscriptionFailed`] if the subscription
    /// could not be established.
    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryStream, MessageLogError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_payload_and_token() {
        let id = Uuid::new_v4();
        let envelope = Envelope::new(vec![1, 2, 3], id);
        assert_eq!(envelope.payload, vec![1, 2, 3]);
        assert_eq!(envelope.correlation_id, id);
    }

    #[test]
    fn errors_display_topic_and_reason() {
        let err = MessageLogError::PublishFailed {
            topic: "todo-checked".to_string(),
            reason: "broker unreachable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "publish failed for topic 'todo-checked': broker unreachable"
        );
    }
}
