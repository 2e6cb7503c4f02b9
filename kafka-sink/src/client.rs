//! The messaging client seam and its rdkafka implementation.

use crate::config::ProducerConfig;
use crate::error::{BoxError, Result};
use async_trait::async_trait;
use kafka_messages::OutboundMessage;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as RdProducer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Broker acknowledgment for one published record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// A client able to publish records and release its connection.
///
/// [`MessagePublisher`](crate::MessagePublisher) owns one of these for its
/// whole lifetime and never calls it again after `shutdown`.
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Submits one record and resolves once the broker acknowledged or
    /// rejected it.
    async fn publish(
        &self,
        message: OutboundMessage<'_>,
    ) -> std::result::Result<Delivery, BoxError>;

    /// Flushes anything the client buffered and releases the connection.
    ///
    /// This blocks the calling thread for up to `timeout`.
    fn shutdown(&self, timeout: Duration) -> std::result::Result<(), BoxError>;
}

/// [`MessageClient`] backed by an rdkafka `FutureProducer`.
pub struct KafkaClient {
    inner: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaClient {
    /// Creates a client from a producer configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or rdkafka refuses to
    /// create the producer.
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        config.validate()?;
        info!("Creating Kafka producer with brokers: {}", config.brokers);

        let inner: FutureProducer = config.client_config().create()?;
        Ok(Self {
            inner,
            queue_timeout: config.queue_timeout,
        })
    }

    /// Creates a client with a custom rdkafka configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the producer cannot be created.
    pub fn from_config(config: ClientConfig, queue_timeout: Duration) -> Result<Self> {
        let inner: FutureProducer = config.create()?;
        Ok(Self {
            inner,
            queue_timeout,
        })
    }
}

#[async_trait]
impl MessageClient for KafkaClient {
    async fn publish(
        &self,
        message: OutboundMessage<'_>,
    ) -> std::result::Result<Delivery, BoxError> {
        let mut record = FutureRecord::<[u8], [u8]>::to(message.topic).payload(message.value);
        if let Some(key) = message.key {
            record = record.key(key);
        }

        match self.inner.send(record, self.queue_timeout).await {
            Ok((partition, offset)) => Ok(Delivery { partition, offset }),
            Err((kafka_err, _msg)) => Err(Box::new(kafka_err)),
        }
    }

    fn shutdown(&self, timeout: Duration) -> std::result::Result<(), BoxError> {
        debug!("Flushing Kafka producer (timeout: {:?})", timeout);
        RdProducer::flush(&self.inner, timeout)?;
        Ok(())
    }
}
