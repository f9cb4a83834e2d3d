//! # Todo Pipeline Core
//!
//! Core types and components for an asynchronous command-ingestion
//! pipeline: create requests are accepted synchronously, published to a
//! durable ordered message log, and persisted later by an independent
//! subscriber.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐    ┌─────────────────────┐    ┌──────────────────┐
//! │  client  │───►│   inbound handler   │───►│ CommandPublisher │
//! └──────────┘    │ (todo-pipeline-web) │    └────────┬─────────┘
//!                 └─────────────────────┘             │
//!                                                     ▼
//!                                           ┌──────────────────┐
//!                                           │    MessageLog    │
//!                                           │  (todo-checked)  │
//!                                           └────────┬─────────┘
//!                                                    │
//!                                                    ▼
//!                                          ┌───────────────────┐
//!                                          │ CommandSubscriber │
//!                                          └────────┬──────────┘
//!                                                   │
//!                                                   ▼
//!                                          ┌───────────────────┐
//!                                          │    TodoService    │
//!                                          └───────────────────┘
//! ```
//!
//! Control flow is one-directional and asynchronous past the publish
//! point: the synchronous response carries no confirmation that
//! persistence has occurred, and no identity is known when it returns.
//!
//! ## Key Principles
//!
//! - **At-least-once delivery**: the subscriber acknowledges a record only
//!   after successful persistence; the persistence service must tolerate
//!   duplicate create commands.
//! - **Explicit trace context**: a [`trace::RequestSpan`] is passed
//!   explicitly through the publish path and its correlation identity
//!   travels with every envelope. There is no ambient thread-local span.
//! - **Structural decode**: payloads are decoded into typed commands;
//!   malformed records are reported, acknowledged, and dropped.

pub mod codec;
pub mod message_log;
pub mod publisher;
pub mod service;
pub mod subscriber;
pub mod todo;
pub mod trace;

pub use message_log::{Delivery, DeliveryStream, Envelope, MessageLog, MessageLogError};
pub use publisher::{CommandPublisher, PublishError};
pub use service::{TodoService, TodoServiceError};
pub use subscriber::{CommandSubscriber, ProcessOutcome};
pub use todo::{Todo, TodoDraft, TodoId};
pub use trace::{RequestSpan, SpanStatus};
