//! Outbound Kafka record definitions.
//!
//! This crate provides [`OutboundMessage`], the per-write record handed from a
//! sink to the Kafka client. A message borrows its topic, key and value from
//! the caller and lives only as long as one publish call.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A single record on its way to a Kafka topic.
///
/// The value is always present (it may be empty). An absent key leaves
/// partition assignment to the client's default partitioner.
///
/// # Example
///
/// ```
/// use kafka_messages::OutboundMessage;
///
/// let message = OutboundMessage::new("events", None, b"hello");
/// assert_eq!(message.topic, "events");
/// assert_eq!(message.encoded_value(), "aGVsbG8=");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundMessage<'a> {
    /// Destination topic.
    pub topic: &'a str,

    /// Optional record key.
    pub key: Option<&'a [u8]>,

    /// Record payload.
    pub value: &'a [u8],
}

impl<'a> OutboundMessage<'a> {
    /// Creates a message for `topic`.
    pub fn new(topic: &'a str, key: Option<&'a [u8]>, value: &'a [u8]) -> Self {
        Self { topic, key, value }
    }

    /// Returns the value as standard padded base64.
    pub fn encoded_value(&self) -> String {
        STANDARD.encode(self.value)
    }

    /// Copies the message out of the caller's buffers.
    pub fn to_owned_message(&self) -> OwnedMessage {
        OwnedMessage {
            topic: self.topic.to_string(),
            key: self.key.map(<[u8]>::to_vec),
            value: self.value.to_vec(),
        }
    }
}

/// An owned copy of an [`OutboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

impl OwnedMessage {
    /// Borrows this message back as an [`OutboundMessage`].
    pub fn as_outbound(&self) -> OutboundMessage<'_> {
        OutboundMessage::new(&self.topic, self.key.as_deref(), &self.value)
    }
}
