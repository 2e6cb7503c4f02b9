//! Record publisher that waits for every acknowledgment.

use crate::client::{KafkaClient, MessageClient};
use crate::config::{PayloadLogging, ProducerConfig};
use crate::error::{BoxError, KafkaError, Result};
use kafka_messages::OutboundMessage;
use std::time::Duration;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Publishes records to one fixed topic, one acknowledged record at a time.
///
/// The publisher owns its client. `write` submits a record and does not
/// return until the broker has acknowledged or rejected it; there is no
/// batching or retry at this layer. `close` flushes and releases the client,
/// after which every `write` fails with [`KafkaError::Closed`].
///
/// # Example
///
/// ```no_run
/// use kafka_sink::{MessagePublisher, ProducerConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ProducerConfig::new("localhost:9092", "events");
///     let mut publisher = MessagePublisher::from_config(&config)?;
///
///     publisher.write(None, b"hello").await?;
///     publisher.write(Some(b"user-1".as_slice()), b"world").await?;
///
///     publisher.close().await?;
///     Ok(())
/// }
/// ```
pub struct MessagePublisher<C: MessageClient + 'static = KafkaClient> {
    client: Option<C>,
    topic: String,
    payload_logging: PayloadLogging,
    flush_timeout: Duration,
    cancellation: CancellationToken,
}

impl MessagePublisher<KafkaClient> {
    /// Creates a publisher backed by a new rdkafka producer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the producer
    /// cannot be created.
    pub fn from_config(config: &ProducerConfig) -> Result<Self> {
        let client = KafkaClient::new(config)?;
        Ok(Self::new(client, config.topic.clone())
            .with_payload_logging(config.payload_logging)
            .with_flush_timeout(config.flush_timeout))
    }
}

impl<C: MessageClient + 'static> MessagePublisher<C> {
    /// Wraps a ready client. Performs no I/O.
    pub fn new(client: C, topic: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            topic: topic.into(),
            payload_logging: PayloadLogging::default(),
            flush_timeout: Duration::from_secs(5),
            cancellation: CancellationToken::new(),
        }
    }

    /// Aborts pending waits with [`KafkaError::Cancelled`] once `token` is
    /// cancelled.
    ///
    /// A fired token stays fired: every later `write` returns `Cancelled`
    /// without submitting or logging anything until the token is replaced
    /// with [`reset_cancellation`](Self::reset_cancellation). `close` still
    /// flushes and reports the flush outcome when the token fired before it
    /// was called.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Replaces the cancellation token, typically after a `Cancelled` error
    /// has been handled and the caller wants to keep writing.
    pub fn reset_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    /// Returns true while the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Sets the payload logging policy.
    pub fn with_payload_logging(mut self, policy: PayloadLogging) -> Self {
        self.payload_logging = policy;
        self
    }

    /// Sets how long `close` waits for the client to flush.
    pub fn with_flush_timeout(mut self, duration: Duration) -> Self {
        self.flush_timeout = duration;
        self
    }

    /// The destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns true once `close` has taken the client.
    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    /// Publishes one record and waits for the broker's acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`KafkaError::Closed`] if the publisher was closed; nothing is sent.
    /// - [`KafkaError::Publish`] if the client or broker rejected the record.
    /// - [`KafkaError::Cancelled`] if the cancellation token fired first.
    pub async fn write(&self, key: Option<&[u8]>, value: &[u8]) -> Result<()> {
        let client = self.client.as_ref().ok_or_else(|| KafkaError::Closed {
            topic: self.topic.clone(),
        })?;

        if self.cancellation.is_cancelled() {
            warn!("Publish to topic '{}' refused, cancellation already requested", self.topic);
            return Err(KafkaError::Cancelled {
                topic: self.topic.clone(),
            });
        }

        let message = OutboundMessage::new(&self.topic, key, value);
        if self.payload_logging == PayloadLogging::Base64 {
            info!(topic = %self.topic, "encoded body={}", message.encoded_value());
        }

        let result = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                warn!(
                    "Publish to topic '{}' cancelled while awaiting acknowledgment",
                    self.topic
                );
                return Err(KafkaError::Cancelled {
                    topic: self.topic.clone(),
                });
            }
            result = client.publish(message) => result,
        };

        match result {
            Ok(delivery) => {
                debug!(
                    "Message sent successfully to topic '{}' (partition: {}, offset: {})",
                    self.topic, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err(source) => {
                error!("Failed to send message to topic '{}': {}", self.topic, source);
                Err(KafkaError::Publish {
                    topic: self.topic.clone(),
                    source,
                })
            }
        }
    }

    /// Writes records in order, stopping at the first failure.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns the error of the first record that failed; records before it
    /// stay published.
    pub async fn write_all<I, K, V>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = (Option<K>, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut written = 0;
        for (key, value) in records {
            self.write(key.as_ref().map(|k| k.as_ref()), value.as_ref())
                .await?;
            written += 1;
        }
        Ok(written)
    }

    /// Flushes and releases the client.
    ///
    /// Closing an already closed publisher is a no-op. The publisher is closed
    /// after this call whatever the outcome.
    ///
    /// If the cancellation token had already fired when `close` was called,
    /// the flush is awaited regardless so its outcome is still reported.
    ///
    /// # Errors
    ///
    /// - [`KafkaError::Publish`] if the flush failed.
    /// - [`KafkaError::Cancelled`] if the token fired while waiting for the
    ///   flush. The flush keeps running on the blocking pool and its outcome
    ///   is logged when it completes.
    pub async fn close(&mut self) -> Result<()> {
        let Some(client) = self.client.take() else {
            debug!("Publisher for topic '{}' already closed", self.topic);
            return Ok(());
        };

        info!("Closing publisher for topic '{}'", self.topic);
        let timeout = self.flush_timeout;
        let mut shutdown = tokio::task::spawn_blocking(move || client.shutdown(timeout));

        if self.cancellation.is_cancelled() {
            debug!(
                "Cancellation already requested, flushing publisher for topic '{}' anyway",
                self.topic
            );
            return self.finish_close(shutdown.await);
        }

        let joined = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => None,
            joined = &mut shutdown => Some(joined),
        };

        let Some(joined) = joined else {
            warn!("Close of publisher for topic '{}' cancelled", self.topic);
            let topic = self.topic.clone();
            tokio::spawn(async move {
                match flush_outcome(shutdown.await) {
                    Ok(()) => debug!("Publisher for topic '{}' flushed after cancel", topic),
                    Err(source) => error!(
                        "Flush of publisher for topic '{}' failed after cancelled close: {}",
                        topic, source
                    ),
                }
            });
            return Err(KafkaError::Cancelled {
                topic: self.topic.clone(),
            });
        };

        self.finish_close(joined)
    }

    fn finish_close(&self, joined: JoinedFlush) -> Result<()> {
        match flush_outcome(joined) {
            Ok(()) => {
                info!("Publisher for topic '{}' closed", self.topic);
                Ok(())
            }
            Err(source) => {
                error!("Failed to close publisher for topic '{}': {}", self.topic, source);
                Err(KafkaError::Publish {
                    topic: self.topic.clone(),
                    source,
                })
            }
        }
    }
}

type JoinedFlush = std::result::Result<std::result::Result<(), BoxError>, JoinError>;

fn flush_outcome(joined: JoinedFlush) -> std::result::Result<(), BoxError> {
    match joined {
        Ok(outcome) => outcome,
        Err(join_err) => Err(Box::new(join_err)),
    }
}

impl<C: MessageClient + 'static> Drop for MessagePublisher<C> {
    fn drop(&mut self) {
        if self.client.take().is_some() {
            warn!(
                "Publisher for topic '{}' dropped without close; buffered records may be lost",
                self.topic
            );
        }
    }
}
