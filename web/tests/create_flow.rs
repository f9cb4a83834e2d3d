//! End-to-end tests for the asynchronous create flow.
//!
//! These wire the real router, publisher, and subscriber together over the
//! in-memory message log and verify the full path: an accepted request
//! reaches the persistence service within a bounded window, a rejected one
//! never touches the log.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;
use todo_pipeline_core::{CommandPublisher, CommandSubscriber};
use todo_pipeline_testing::{InMemoryMessageLog, InMemoryTodoService};
use todo_pipeline_web::{AppState, routes};
use tower::ServiceExt;

const TOPIC: &str = "todo-checked";

struct Harness {
    app: axum::Router,
    log: Arc<InMemoryMessageLog>,
    service: Arc<InMemoryTodoService>,
}

fn harness() -> Harness {
    todo_pipeline_testing::init_tracing();

    let log = Arc::new(InMemoryMessageLog::new());
    let service = Arc::new(InMemoryTodoService::new());

    let publisher = Arc::new(CommandPublisher::new(log.clone(), TOPIC));
    let subscriber = CommandSubscriber::new(log.clone(), TOPIC, service.clone());
    tokio::spawn(async move {
        let _ = subscriber.run().await;
    });

    Harness {
        app: routes(AppState::new(publisher, service.clone())),
        log,
        service,
    }
}

fn post_todo(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/todo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_for_create_calls(service: &InMemoryTodoService, n: usize) {
    for _ in 0..500 {
        if service.create_calls().await.len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("persistence service never saw {n} create call(s)");
}

#[tokio::test]
async fn accepted_create_reaches_the_persistence_service() {
    let harness = harness();

    let response = harness
        .app
        .oneshot(post_todo(r#"{"title":"buy milk","done":false}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    // The response carries the correlation token for trace stitching.
    assert!(response.headers().get("X-Correlation-ID").is_some());

    wait_for_create_calls(&harness.service, 1).await;

    let calls = harness.service.create_calls().await;
    assert_eq!(calls[0].title, "buy milk");
    assert!(!calls[0].done);
    assert_eq!(harness.service.len().await, 1);
}

#[tokio::test]
async fn rejected_create_publishes_nothing() {
    let harness = harness();

    let response = harness.app.clone().oneshot(post_todo("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

    let response = harness
        .app
        .clone()
        .oneshot(post_todo(r#"{"done":true}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

    // Give the subscriber a moment to (wrongly) pick something up.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(harness.log.published(TOPIC).await.is_empty());
    assert!(harness.service.create_calls().await.is_empty());
}

#[tokio::test]
async fn transient_store_failure_is_retried_to_completion() {
    let harness = harness();
    harness.service.fail_next_creates(1).await;

    let response = harness
        .app
        .oneshot(post_todo(r#"{"title":"buy milk"}"#))
        .await
        .unwrap();
    // The synchronous answer does not depend on the consume side.
    assert_eq!(response.status(), StatusCode::CREATED);

    // First delivery fails, the redelivered one succeeds.
    wait_for_create_calls(&harness.service, 2).await;

    for _ in 0..500 {
        if harness.log.committed_offset(TOPIC).await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(harness.log.committed_offset(TOPIC).await, 1);
    assert_eq!(harness.service.len().await, 1);
}
