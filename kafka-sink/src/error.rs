//! Error types for the Kafka sink.

use thiserror::Error;

/// Result type alias for sink operations.
pub type Result<T> = std::result::Result<T, KafkaError>;

/// Boxed cause reported by a [`MessageClient`](crate::MessageClient).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while publishing records.
#[derive(Error, Debug)]
pub enum KafkaError {
    /// Error from the underlying rdkafka library while building a client.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// The client failed to publish or flush; the broker's or client's
    /// cause is kept as the source.
    #[error("Failed to publish to topic '{topic}': {source}")]
    Publish {
        topic: String,
        #[source]
        source: BoxError,
    },

    /// The wait for an acknowledgment or a flush was aborted.
    #[error("Publish to topic '{topic}' was cancelled")]
    Cancelled { topic: String },

    /// The publisher was used after `close`.
    #[error("Publisher for topic '{topic}' is closed")]
    Closed { topic: String },

    /// Invalid producer configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KafkaError {
    /// Returns true if the broker or client reported the failure.
    pub fn is_publish(&self) -> bool {
        matches!(self, Self::Publish { .. })
    }

    /// Returns true if the wait was aborted by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if the publisher had already been closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}
