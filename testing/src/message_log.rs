//! In-memory message log with real commit semantics.
//!
//! [`InMemoryMessageLog`] miniaturizes the production log faithfully enough
//! to test the acknowledgment discipline: records are appended per topic,
//! a committed offset tracks the subscriber's progress, and the record at
//! the committed offset is delivered (and redelivered) until it is
//! acknowledged. Ordering is total: the in-memory log models a single
//! partition.

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use todo_pipeline_core::message_log::{
    Acknowledge, Delivery, DeliveryStream, Envelope, MessageLog, MessageLogError,
};

#[derive(Default)]
struct TopicState {
    records: Vec<Envelope>,
    committed: usize,
}

#[derive(Default)]
struct Inner {
    topics: Mutex<HashMap<String, TopicState>>,
    fail_next_publishes: Mutex<usize>,
    notify: Notify,
}

/// In-memory [`MessageLog`] for tests.
///
/// Cloning shares the underlying log, so a publisher and a subscriber can
/// hold the same instance just like they would share one broker.
///
/// # Examples
///
/// ```
/// use todo_pipeline_core::message_log::{Envelope, MessageLog};
/// use todo_pipeline_testing::InMemoryMessageLog;
/// use futures::StreamExt;
/// use uuid::Uuid;
///
/// # tokio_test::block_on(async {
/// let log = InMemoryMessageLog::new();
/// let envelope = Envelope::new(b"payload".to_vec(), Uuid::new_v4());
/// log.publish("todo-checked", &envelope).await.unwrap();
///
/// let mut stream = log.subscribe("todo-checked").await.unwrap();
/// let delivery = stream.next().await.unwrap().unwrap();
/// assert_eq!(delivery.envelope, envelope);
/// delivery.ack().await.unwrap();
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryMessageLog {
    inner: Arc<Inner>,
}

impl InMemoryMessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` publish calls fail with
    /// [`MessageLogError::PublishFailed`], simulating an unreachable
    /// broker.
    pub async fn fail_next_publishes(&self, n: usize) {
        *self.inner.fail_next_publishes.lock().await = n;
    }

    /// All records appended to a topic, in publish order.
    pub async fn published(&self, topic: &str) -> Vec<Envelope> {
        self.inner
            .topics
            .lock()
            .await
            .get(topic)
            .map(|state| state.records.clone())
            .unwrap_or_default()
    }

    /// The committed (acknowledged) offset for a topic.
    pub async fn committed_offset(&self, topic: &str) -> usize {
        self.inner
            .topics
            .lock()
            .await
            .get(topic)
            .map_or(0, |state| state.committed)
    }
}

struct InMemoryAcknowledge {
    inner: Arc<Inner>,
    topic: String,
    offset: usize,
}

impl Acknowledge for InMemoryAcknowledge {
    fn ack(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send>> {
        Box::pin(async move {
            let mut topics = self.inner.topics.lock().await;
            let state = topics.entry(self.topic.clone()).or_default();
            state.committed = state.committed.max(self.offset + 1);
            Ok(())
        })
    }
}

impl MessageLog for InMemoryMessageLog {
    fn publish(
        &self,
        topic: &str,
        envelope: &Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), MessageLogError>> + Send + '_>> {
        let topic = topic.to_string();
        let envelope = envelope.clone();

        Box::pin(async move {
            {
                let mut fail = self.inner.fail_next_publishes.lock().await;
                if *fail > 0 {
                    *fail -= 1;
                    return Err(MessageLogError::PublishFailed {
                        topic,
                        reason: "injected failure".to_string(),
                    });
                }
            }

            let mut topics = self.inner.topics.lock().await;
            topics.entry(topic).or_default().records.push(envelope);
            drop(topics);
            self.inner.notify.notify_waiters();
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryStream, MessageLogError>> + Send + '_>> {
        let inner = Arc::clone(&self.inner);
        let topic = topic.to_string();

        Box::pin(async move {
            let stream = async_stream::stream! {
                loop {
                    // Register for wakeups before checking, so a publish
                    // between the check and the await is not missed.
                    let notified = inner.notify.notified();

                    let next = {
                        let mut topics = inner.topics.lock().await;
                        let state = topics.entry(topic.clone()).or_default();
                        if state.committed < state.records.len() {
                            let offset = state.committed;
                            Some((state.records[offset].clone(), offset))
                        } else {
                            None
                        }
                    };

                    match next {
                        Some((envelope, offset)) => {
                            // The record at the committed offset is delivered
                            // again on every poll until it is acknowledged.
                            let delivery = Delivery::new(
                                envelope,
                                0,
                                i64::try_from(offset).unwrap_or(i64::MAX),
                                Some(Utc::now()),
                                Box::new(InMemoryAcknowledge {
                                    inner: Arc::clone(&inner),
                                    topic: topic.clone(),
                                    offset,
                                }),
                            );
                            yield Ok(delivery);
                        }
                        None => notified.await,
                    }
                }
            };

            Ok(Box::pin(stream) as DeliveryStream)
        })
    }
}
