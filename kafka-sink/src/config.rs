//! Producer configuration.

use crate::error::{KafkaError, Result};
use rdkafka::ClientConfig;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::BTreeMap;
use std::time::Duration;

const MAX_TOPIC_LENGTH: usize = 249;

/// Broker acknowledgment level required before a publish resolves.
///
/// Deserializes from `"all"`, `"-1"`, `"1"`, `"0"` or the numbers `-1`, `1`
/// and `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "AcksRepr")]
pub enum Acks {
    /// Wait for the full in-sync replica set.
    #[default]
    All,
    /// Wait for the partition leader only.
    Leader,
    /// Do not wait for the broker.
    None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AcksRepr {
    Number(i64),
    Text(String),
}

impl TryFrom<AcksRepr> for Acks {
    type Error = String;

    fn try_from(repr: AcksRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            AcksRepr::Number(-1) => Ok(Acks::All),
            AcksRepr::Number(1) => Ok(Acks::Leader),
            AcksRepr::Number(0) => Ok(Acks::None),
            AcksRepr::Text(text) => match text.as_str() {
                "all" | "-1" => Ok(Acks::All),
                "1" => Ok(Acks::Leader),
                "0" => Ok(Acks::None),
                _ => Err(format!("invalid acks '{text}', expected all, -1, 1 or 0")),
            },
            AcksRepr::Number(n) => Err(format!("invalid acks {n}, expected -1, 1 or 0")),
        }
    }
}

impl Acks {
    fn as_str(self) -> &'static str {
        match self {
            Acks::All => "all",
            Acks::Leader => "1",
            Acks::None => "0",
        }
    }
}

/// Compression codec applied by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

impl Compression {
    fn as_str(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Snappy => "snappy",
            Compression::Lz4 => "lz4",
            Compression::Zstd => "zstd",
        }
    }
}

/// Whether each write logs its payload.
///
/// `Base64` emits one `info` event per write with the value encoded as
/// base64, before the outcome is known. Payloads end up in the logs in a
/// reversible form, so turn this off for sensitive topics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadLogging {
    #[default]
    Base64,
    Disabled,
}

/// Configuration for the Kafka sink.
///
/// Unknown keys are rejected, so a misspelled timeout fails instead of
/// silently keeping its default.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerConfig {
    /// Comma-separated list of Kafka brokers.
    pub brokers: String,

    /// Destination topic for every record.
    pub topic: String,

    /// Acknowledgment level.
    pub acks: Acks,

    /// Compression codec.
    pub compression: Compression,

    /// Client-side delivery timeout (`message.timeout.ms`).
    #[serde(rename = "message_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub message_timeout: Duration,

    /// How long `send` may wait for room in the client queue.
    #[serde(rename = "queue_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub queue_timeout: Duration,

    /// How long `close` waits for buffered records to flush.
    #[serde(rename = "flush_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub flush_timeout: Duration,

    /// Payload logging policy.
    pub payload_logging: PayloadLogging,

    /// Extra librdkafka properties, applied after everything else.
    pub properties: BTreeMap<String, String>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            brokers: String::new(),
            topic: String::new(),
            acks: Acks::default(),
            compression: Compression::default(),
            message_timeout: Duration::from_secs(5),
            queue_timeout: Duration::from_secs(5),
            flush_timeout: Duration::from_secs(5),
            payload_logging: PayloadLogging::default(),
            properties: BTreeMap::new(),
        }
    }
}

impl ProducerConfig {
    /// Creates a new producer configuration.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated list of Kafka brokers
    /// * `topic` - Destination topic
    pub fn new(brokers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| KafkaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `KAFKA_BROKERS`, `KAFKA_TOPIC` and the optional
    /// `KAFKA_PROPERTIES` (`key:value,key:value`) from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the result is
    /// invalid.
    pub fn from_env() -> Result<Self> {
        let brokers = std::env::var("KAFKA_BROKERS")
            .map_err(|_| KafkaError::Config("KAFKA_BROKERS is not set".to_string()))?;
        let topic = std::env::var("KAFKA_TOPIC")
            .map_err(|_| KafkaError::Config("KAFKA_TOPIC is not set".to_string()))?;

        let mut config = Self::new(brokers, topic);
        if let Ok(raw) = std::env::var("KAFKA_PROPERTIES") {
            config.properties = parse_properties(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the acknowledgment level.
    pub fn with_acks(mut self, acks: Acks) -> Self {
        self.acks = acks;
        self
    }

    /// Sets the compression codec.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the client-side delivery timeout.
    pub fn with_message_timeout(mut self, duration: Duration) -> Self {
        self.message_timeout = duration;
        self
    }

    /// Sets the enqueue timeout.
    pub fn with_queue_timeout(mut self, duration: Duration) -> Self {
        self.queue_timeout = duration;
        self
    }

    /// Sets the flush timeout used on close.
    pub fn with_flush_timeout(mut self, duration: Duration) -> Self {
        self.flush_timeout = duration;
        self
    }

    /// Sets the payload logging policy.
    pub fn with_payload_logging(mut self, policy: PayloadLogging) -> Self {
        self.payload_logging = policy;
        self
    }

    /// Adds an extra librdkafka property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Checks brokers and topic.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.brokers.trim().is_empty() {
            return Err(KafkaError::Config("brokers must not be empty".to_string()));
        }
        validate_topic(&self.topic)
    }

    /// Builds the rdkafka client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("acks", self.acks.as_str())
            .set("compression.type", self.compression.as_str())
            .set(
                "message.timeout.ms",
                self.message_timeout.as_millis().to_string(),
            );

        for (key, value) in &self.properties {
            client_config.set(key, value);
        }
        client_config
    }
}

/// Parses `key:value,key:value` into a property map.
///
/// Whitespace around keys and values is trimmed and empty entries are
/// skipped. Only the first `:` separates key from value.
///
/// # Errors
///
/// Returns [`KafkaError::Config`] for an entry without `:` or with an empty
/// key.
pub fn parse_properties(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| KafkaError::Config(format!("invalid property '{entry}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(KafkaError::Config(format!("invalid property '{entry}'")));
        }
        properties.insert(key.to_string(), value.trim().to_string());
    }
    Ok(properties)
}

fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(KafkaError::Config("topic must not be empty".to_string()));
    }
    if topic == "." || topic == ".." {
        return Err(KafkaError::Config(format!("topic '{topic}' is reserved")));
    }
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(KafkaError::Config(format!(
            "topic is longer than {MAX_TOPIC_LENGTH} characters"
        )));
    }
    if let Some(c) = topic
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(KafkaError::Config(format!(
            "topic '{topic}' contains illegal character '{c}'"
        )));
    }
    Ok(())
}
