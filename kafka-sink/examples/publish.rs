//! Example Kafka sink publishing raw records to one topic.
//!
//! This example shows how to:
//! - Load a `ProducerConfig` from the environment
//! - Create a `MessagePublisher`
//! - Write unkeyed and keyed records, each awaited until acknowledged
//! - Close the publisher so buffered state is flushed
//!
//! To run this example:
//! ```bash
//! KAFKA_BROKERS=localhost:9092 KAFKA_TOPIC=events cargo run --example publish
//! ```
//!
//! Make sure you have a Kafka broker running.

use kafka_sink::{CancellationToken, MessagePublisher, ProducerConfig};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Kafka sink example");

    let config = ProducerConfig::from_env()?;
    let token = CancellationToken::new();

    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut publisher = MessagePublisher::from_config(&config)?.with_cancellation(token);
    info!("Publisher created for topic '{}'", publisher.topic());

    for i in 1..=5 {
        let body = format!("{{\"event\":\"page_view\",\"seq\":{i}}}");
        publisher.write(None, body.as_bytes()).await?;
    }

    // Records sharing a key land on the same partition.
    let orders = (1..=3).map(|i| (Some(format!("user-{i}")), format!("order-{i}")));
    let written = publisher.write_all(orders).await?;
    info!("Wrote {} keyed records", written);

    publisher.close().await?;
    info!("All records acknowledged");
    Ok(())
}
