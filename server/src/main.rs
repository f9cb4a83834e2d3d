//! Todo service binary.
//!
//! Wires the pipeline together: one HTTP listener accepting requests and
//! one command subscriber consuming the create-records topic. Both sides
//! share the same Kafka-compatible message log and the same todo store.

mod config;
mod store;

use config::Config;
use std::sync::Arc;
use store::ListTodoStore;
use todo_pipeline_core::service::TodoService;
use todo_pipeline_core::{CommandPublisher, CommandSubscriber};
use todo_pipeline_redpanda::RedpandaMessageLog;
use todo_pipeline_web::{AppState, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "starting todo service");

    let log = Arc::new(
        RedpandaMessageLog::builder()
            .brokers(&config.brokers)
            .consumer_group(&config.consumer_group)
            .build()?,
    );

    let todos: Arc<dyn TodoService> = Arc::new(ListTodoStore::new());
    let publisher = Arc::new(CommandPublisher::new(log.clone(), &config.topic));

    // The consume side runs decoupled from the request handlers: if it
    // falls behind or restarts, accepted commands wait on the topic.
    let subscriber = CommandSubscriber::new(log, &config.topic, todos.clone());
    tokio::spawn(async move {
        if let Err(e) = subscriber.run().await {
            tracing::error!(error = %e, "command subscriber exited");
        }
    });

    let app = routes(AppState::new(publisher, todos));
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, "http listener started");
    axum::serve(listener, app).await?;

    Ok(())
}
