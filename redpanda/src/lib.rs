//! Redpanda message log implementation for the todo ingestion pipeline.
//!
//! This crate provides a production [`MessageLog`] backed by a
//! Kafka-compatible broker, using rdkafka. It works with Redpanda, Apache
//! Kafka, AWS MSK, or any other Kafka-protocol system.
//!
//! # Delivery Semantics
//!
//! **At-least-once delivery** with manual, consumer-side offset commits:
//! - The producer resolves a publish once the broker acknowledges the
//!   write (`acks` is configurable; the default waits for the leader).
//! - Offsets are committed per record, through [`Delivery::ack`], only
//!   when the subscriber decides processing is complete. A record whose
//!   delivery is dropped without an ack is redelivered after the next
//!   rebalance or restart.
//! - Ordering is guaranteed within a partition. The trace correlation
//!   token travels in a `correlation-id` record header, keeping the
//!   payload a pure serialized command.
//!
//! # Example
//!
//! ```no_run
//! use todo_pipeline_redpanda::RedpandaMessageLog;
//! use todo_pipeline_core::message_log::{Envelope, MessageLog};
//! use futures::StreamExt;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let log = RedpandaMessageLog::builder()
//!     .brokers("localhost:9092")
//!     .consumer_group("todo-service")
//!     .build()?;
//!
//! // Publish an envelope
//! let envelope = Envelope::new(br#"{"title":"buy milk"}"#.to_vec(), Uuid::new_v4());
//! log.publish("todo-checked", &envelope).await?;
//!
//! // Consume and acknowledge
//! let mut deliveries = log.subscribe("todo-checked").await?;
//! if let Some(Ok(delivery)) = deliveries.next().await {
//!     // ... process ...
//!     delivery.ack().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::DateTime;
use rdkafka::TopicPartitionList;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{Header, Headers, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Offset;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use todo_pipeline_core::message_log::{
    Acknowledge, Delivery, DeliveryStream, Envelope, MessageLog, MessageLogError,
};
use uuid::Uuid;

/// Record header carrying the trace correlation token.
const CORRELATION_ID_HEADER: &str = "correlation-id";

/// Kafka-compatible message log.
///
/// One instance is shared between all concurrent publishers and the
/// subscriber loop; the producer is thread-safe and each subscription gets
/// its own consumer.
///
/// # Configuration
///
/// - **Broker addresses**: bootstrap servers (required)
/// - **Producer settings**: acks, send timeout
/// - **Consumer group**: explicit ID, or derived from the topic
/// - **Buffer size**: delivery channel capacity (default: 1000)
/// - **Offset reset**: where new groups start reading (default: "earliest",
///   so commands published before the subscriber first starts are not lost)
pub struct RedpandaMessageLog {
    /// Kafka producer for publishing envelopes.
    producer: FutureProducer,
    /// Broker addresses (for creating consumers).
    brokers: String,
    /// Producer send timeout.
    timeout: Duration,
    /// Consumer group ID (if explicitly set).
    consumer_group: Option<String>,
    /// Delivery buffer size for subscriptions.
    buffer_size: usize,
    /// Auto offset reset policy.
    auto_offset_reset: String,
}

impl RedpandaMessageLog {
    /// Create a message log with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::ConnectionFailed`] if the producer cannot
    /// be created from the given broker addresses.
    pub fn new(brokers: &str) -> Result<Self, MessageLogError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the log client.
    #[must_use]
    pub fn builder() -> RedpandaMessageLogBuilder {
        RedpandaMessageLogBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

/// Builder for configuring a [`RedpandaMessageLog`].
#[derive(Default)]
pub struct RedpandaMessageLogBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaMessageLogBuilder {
    /// Set the broker addresses (comma-separated, e.g. "localhost:9092").
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode.
    ///
    /// "0" (no acks, fire-and-forget), "1" (leader ack), "all" (all
    /// replicas). Default: "1". With "0" a publish can report success for
    /// a write the broker never stored; the default trades a little
    /// latency for durability.
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the producer send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the consumer group ID for subscriptions.
    ///
    /// All subscriber instances sharing a group share committed offsets,
    /// so scaling out adds parallelism without duplicate processing. If
    /// not set, the group is derived from the subscribed topic.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Set the delivery buffer size for subscriptions (default: 1000).
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is 0.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        assert!(buffer_size > 0, "buffer_size must be greater than 0");
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Set the auto offset reset policy for new consumer groups.
    ///
    /// - `"earliest"`: start from the beginning of the topic
    /// - `"latest"`: start from the end (only new records)
    ///
    /// Default: "earliest", so commands published before the subscriber's
    /// group first exists are still consumed.
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaMessageLog`].
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError::ConnectionFailed`] if brokers are not set
    /// or the producer cannot be created.
    pub fn build(self) -> Result<RedpandaMessageLog, MessageLogError> {
        let brokers = self
            .brokers
            .ok_or_else(|| MessageLogError::ConnectionFailed("brokers not configured".to_string()))?;

        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.producer_acks.as_deref().unwrap_or("1"));

        let producer: FutureProducer = producer_config.create().map_err(|e| {
            MessageLogError::ConnectionFailed(format!("failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            acks = self.producer_acks.as_deref().unwrap_or("1"),
            buffer_size = self.buffer_size.unwrap_or(1000),
            auto_offset_reset = self.auto_offset_reset.as_deref().unwrap_or("earliest"),
            "RedpandaMessageLog created"
        );

        Ok(RedpandaMessageLog {
            producer,
            brokers,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
            consumer_group: self.consumer_group,
            buffer_size: self.buffer_size.unwrap_or(1000),
            auto_offset_reset: self
                .auto_offset_reset
                .unwrap_or_else(|| "earliest".to_string()),
        })
    }
}

/// Commits one record's offset through the shared consumer.
struct KafkaAcknowledge {
    consumer: Arc<StreamConsumer>,
    topic: String,
    partition: i32,
    offset: i64,
}

impl Acknowledge for KafkaAcknowledge {
    fn ack(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send>> {
        Box::pin(async move {
            let mut tpl = TopicPartitionList::new();
            // Committed offset is the NEXT record to read, hence offset + 1.
            tpl.add_partition_offset(&self.topic, self.partition, Offset::Offset(self.offset + 1))
                .map_err(|e| MessageLogError::CommitFailed {
                    topic: self.topic.clone(),
                    reason: e.to_string(),
                })?;

            self.consumer
                .commit(&tpl, CommitMode::Async)
                .map_err(|e| MessageLogError::CommitFailed {
                    topic: self.topic.clone(),
                    reason: e.to_string(),
                })?;

            tracing::trace!(
                topic = %self.topic,
                partition = self.partition,
                offset = self.offset,
                "offset committed"
            );
            Ok(())
        })
    }
}

/// Extract the correlation token from record headers, if present.
fn correlation_id_from_headers(message: &impl Message) -> Option<Uuid> {
    message.headers().and_then(|headers| {
        headers
            .iter()
            .find(|h| h.key == CORRELATION_ID_HEADER)
            .and_then(|h| h.value)
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|s| Uuid::parse_str(s).ok())
    })
}

impl MessageLog for RedpandaMessageLog {
    fn publish(
        &self,
        topic: &str,
        envelope: &Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send + '_>> {
        // Clone data before moving into the async block
        let topic = topic.to_string();
        let envelope = envelope.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let headers = OwnedHeaders::new().insert(Header {
                key: CORRELATION_ID_HEADER,
                value: Some(envelope.correlation_id.to_string().as_bytes()),
            });

            // No record key: partitioning by an entity grouping is not
            // required for create commands.
            let record = FutureRecord::<(), Vec<u8>>::to(&topic)
                .payload(&envelope.payload)
                .headers(headers);

            let send_result = self.producer.send(record, Timeout::After(timeout)).await;

            match send_result {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        correlation_id = %envelope.correlation_id,
                        "envelope published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %topic,
                        correlation_id = %envelope.correlation_id,
                        error = %kafka_error,
                        "failed to publish envelope"
                    );
                    Err(MessageLogError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryStream, MessageLogError>> + Send + '_>> {
        // Clone configuration before moving into the async block
        let topic = topic.to_string();
        let brokers = self.brokers.clone();
        let consumer_group = self.consumer_group.clone();
        let buffer_size = self.buffer_size;
        let auto_offset_reset = self.auto_offset_reset.clone();

        Box::pin(async move {
            let consumer_group_id =
                consumer_group.unwrap_or_else(|| format!("todo-pipeline-{topic}"));

            // Manual commits: the subscriber acknowledges each record
            // through its Delivery, never the client on its behalf.
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &consumer_group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| MessageLogError::SubscriptionFailed {
                    topic: topic.clone(),
                    reason: format!("failed to create consumer: {e}"),
                })?;

            consumer
                .subscribe(&[topic.as_str()])
                .map_err(|e| MessageLogError::SubscriptionFailed {
                    topic: topic.clone(),
                    reason: format!("failed to subscribe: {e}"),
                })?;

            tracing::info!(
                topic = %topic,
                consumer_group = %consumer_group_id,
                buffer_size,
                auto_offset_reset = %auto_offset_reset,
                manual_commit = true,
                "subscribed to topic"
            );

            let consumer = Arc::new(consumer);
            let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

            // Spawn a task that owns the consumer and forwards deliveries.
            // Each delivery carries an acker holding the shared consumer,
            // so commits happen whenever the subscriber decides, not here.
            tokio::spawn(async move {
                use futures::StreamExt;

                let mut stream = consumer.stream();

                while let Some(msg_result) = stream.next().await {
                    match msg_result {
                        Ok(message) => {
                            let payload =
                                message.payload().map(<[u8]>::to_vec).unwrap_or_default();
                            let correlation_id = correlation_id_from_headers(&message)
                                .unwrap_or_else(Uuid::new_v4);
                            let timestamp = message
                                .timestamp()
                                .to_millis()
                                .and_then(DateTime::from_timestamp_millis);

                            let delivery = Delivery::new(
                                Envelope::new(payload, correlation_id),
                                message.partition(),
                                message.offset(),
                                timestamp,
                                Box::new(KafkaAcknowledge {
                                    consumer: Arc::clone(&consumer),
                                    topic: message.topic().to_string(),
                                    partition: message.partition(),
                                    offset: message.offset(),
                                }),
                            );

                            tracing::trace!(
                                topic = message.topic(),
                                partition = message.partition(),
                                offset = message.offset(),
                                correlation_id = %correlation_id,
                                "record received"
                            );

                            if tx.send(Ok(delivery)).await.is_err() {
                                tracing::debug!("delivery receiver dropped, exiting consumer task");
                                break;
                            }
                        }
                        Err(e) => {
                            let err = MessageLogError::TransportError(format!(
                                "failed to receive record: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                        }
                    }
                }

                tracing::debug!("consumer task exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as DeliveryStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_message_log_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaMessageLog>();
        assert_sync::<RedpandaMessageLog>();
    }

    #[test]
    fn builder_default_works() {
        let _builder = RedpandaMessageLog::builder();
    }

    #[test]
    fn build_without_brokers_fails() {
        let result = RedpandaMessageLog::builder().build();
        assert!(matches!(result, Err(MessageLogError::ConnectionFailed(_))));
    }
}
