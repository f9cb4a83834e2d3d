//! Integration tests for [`RedpandaMessageLog`] against a real broker.
//!
//! These tests validate:
//! - Publish/consume round-trip with the correlation header
//! - Manual offset commits through `Delivery::ack`
//! - Redelivery of unacknowledged records to a fresh consumer
//!
//! # Running These Tests
//!
//! They are `#[ignore]`d by default because they need a running
//! Kafka-compatible broker (Redpanda or Kafka) with topic auto-creation
//! enabled. Point `TODO_TEST_BROKERS` at it and run explicitly:
//!
//! ```bash
//! TODO_TEST_BROKERS=localhost:9092 \
//!     cargo test -p todo-pipeline-redpanda --test integration_tests -- --ignored
//! ```
//!
//! # Panics
//!
//! Setup failures use `expect()`/`panic!()`, which is acceptable in test code.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use futures::StreamExt;
use std::time::Duration;
use todo_pipeline_core::message_log::{Envelope, MessageLog};
use todo_pipeline_redpanda::RedpandaMessageLog;
use uuid::Uuid;

fn test_brokers() -> String {
    std::env::var("TODO_TEST_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

fn unique_topic(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn next_delivery(
    stream: &mut todo_pipeline_core::message_log::DeliveryStream,
) -> todo_pipeline_core::message_log::Delivery {
    tokio::time::timeout(Duration::from_secs(30), stream.next())
        .await
        .expect("timed out waiting for delivery")
        .expect("stream ended unexpectedly")
        .expect("delivery stream yielded an error")
}

#[tokio::test]
#[ignore]
async fn publish_and_consume_round_trip() {
    let topic = unique_topic("todo-checked-it");
    let log = RedpandaMessageLog::builder()
        .brokers(test_brokers())
        .consumer_group(format!("group-{}", Uuid::new_v4().simple()))
        .auto_offset_reset("earliest")
        .build()
        .expect("failed to build log");

    let correlation_id = Uuid::new_v4();
    let payload = br#"{"title":"buy milk","done":false}"#.to_vec();
    log.publish(&topic, &Envelope::new(payload.clone(), correlation_id))
        .await
        .expect("publish failed");

    let mut stream = log.subscribe(&topic).await.expect("subscribe failed");
    let delivery = next_delivery(&mut stream).await;

    assert_eq!(delivery.envelope.payload, payload);
    assert_eq!(delivery.envelope.correlation_id, correlation_id);
    delivery.ack().await.expect("ack failed");
}

#[tokio::test]
#[ignore]
async fn unacknowledged_record_is_redelivered_to_new_consumer() {
    let topic = unique_topic("todo-checked-it");
    let group = format!("group-{}", Uuid::new_v4().simple());
    let build = || {
        RedpandaMessageLog::builder()
            .brokers(test_brokers())
            .consumer_group(group.clone())
            .auto_offset_reset("earliest")
            .build()
            .expect("failed to build log")
    };

    let log = build();
    let correlation_id = Uuid::new_v4();
    log.publish(&topic, &Envelope::new(b"payload".to_vec(), correlation_id))
        .await
        .expect("publish failed");

    // First consumer receives the record but never acknowledges it.
    {
        let mut stream = log.subscribe(&topic).await.expect("subscribe failed");
        let delivery = next_delivery(&mut stream).await;
        assert_eq!(delivery.envelope.correlation_id, correlation_id);
        drop(delivery);
    }

    // A fresh consumer in the same group starts from the committed offset,
    // which never advanced, so the record is delivered again.
    let log = build();
    let mut stream = log.subscribe(&topic).await.expect("subscribe failed");
    let delivery = next_delivery(&mut stream).await;
    assert_eq!(delivery.envelope.correlation_id, correlation_id);
    delivery.ack().await.expect("ack failed");
}

#[tokio::test]
#[ignore]
async fn acknowledged_record_is_not_redelivered() {
    let topic = unique_topic("todo-checked-it");
    let group = format!("group-{}", Uuid::new_v4().simple());

    let log = RedpandaMessageLog::builder()
        .brokers(test_brokers())
        .consumer_group(group.clone())
        .auto_offset_reset("earliest")
        .build()
        .expect("failed to build log");

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    log.publish(&topic, &Envelope::new(b"first".to_vec(), first))
        .await
        .expect("publish failed");

    {
        let mut stream = log.subscribe(&topic).await.expect("subscribe failed");
        let delivery = next_delivery(&mut stream).await;
        assert_eq!(delivery.envelope.correlation_id, first);
        delivery.ack().await.expect("ack failed");
        // Give the async commit a moment to reach the broker.
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    log.publish(&topic, &Envelope::new(b"second".to_vec(), second))
        .await
        .expect("publish failed");

    let log = RedpandaMessageLog::builder()
        .brokers(test_brokers())
        .consumer_group(group)
        .auto_offset_reset("earliest")
        .build()
        .expect("failed to build log");
    let mut stream = log.subscribe(&topic).await.expect("subscribe failed");
    let delivery = next_delivery(&mut stream).await;

    assert_eq!(delivery.envelope.correlation_id, second);
    delivery.ack().await.expect("ack failed");
}
