//! Server configuration from the environment.

/// Runtime configuration, read once at startup.
///
/// | Variable              | Default          |
/// |-----------------------|------------------|
/// | `TODO_HTTP_ADDR`      | `0.0.0.0:8080`   |
/// | `TODO_BROKERS`        | `localhost:9092` |
/// | `TODO_TOPIC`          | `todo-checked`   |
/// | `TODO_CONSUMER_GROUP` | `todo-service`   |
///
/// Log filtering uses the standard `RUST_LOG` variable.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub http_addr: String,
    /// Kafka/Redpanda bootstrap servers.
    pub brokers: String,
    /// Create-records topic.
    pub topic: String,
    /// Consumer group for the command subscriber.
    pub consumer_group: String,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            http_addr: env_or("TODO_HTTP_ADDR", "0.0.0.0:8080"),
            brokers: env_or("TODO_BROKERS", "localhost:9092"),
            topic: env_or("TODO_TOPIC", "todo-checked"),
            consumer_group: env_or("TODO_CONSUMER_GROUP", "todo-service"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
