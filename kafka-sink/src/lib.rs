//! Kafka record sink.
//!
//! This crate publishes `(optional key, value)` byte records to a single Kafka
//! topic on top of `rdkafka` and `tokio`, waiting for the broker to
//! acknowledge each record before accepting the next one.
//!
//! # Features
//!
//! - [`MessagePublisher`] with `write`, `write_all` and `close`
//! - One attempt per record, failures surface as [`KafkaError::Publish`]
//! - Cancellable waits through a `CancellationToken` ([`KafkaError::Cancelled`])
//! - Fail-fast writes after close ([`KafkaError::Closed`])
//! - Optional base64 payload logging
//! - [`MessageClient`] seam so the rdkafka producer can be swapped out
//! - Integrated tracing
//!
//! # Example
//!
//! ```no_run
//! use kafka_sink::{MessagePublisher, ProducerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProducerConfig::new("localhost:9092", "events");
//!     let mut publisher = MessagePublisher::from_config(&config)?;
//!
//!     let written = publisher
//!         .write_all([(None, "first"), (Some("user-1"), "second")])
//!         .await?;
//!     assert_eq!(written, 2);
//!
//!     publisher.close().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod publisher;

pub use client::{Delivery, KafkaClient, MessageClient};
pub use config::{parse_properties, Acks, Compression, PayloadLogging, ProducerConfig};
pub use error::{BoxError, KafkaError, Result};
pub use publisher::MessagePublisher;

/// Re-export the record type for convenience
pub use kafka_messages::{OutboundMessage, OwnedMessage};

/// Re-export of the token accepted by [`MessagePublisher::with_cancellation`].
pub use tokio_util::sync::CancellationToken;
