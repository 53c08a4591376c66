use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchemaViolation;
use crate::topics::Topic;

use super::{codec, Payload};

/// Serializable identity of a producer.
///
/// A human label plus a random instance id, so two producers created with the
/// same label stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerId {
    label: String,
    instance: Uuid,
}

impl ProducerId {
    /// New identity with a fresh random instance id.
    pub fn new(label: impl Into<String>) -> Self {
        Self::from_parts(label, Uuid::new_v4())
    }

    pub fn from_parts(label: impl Into<String>, instance: Uuid) -> Self {
        Self {
            label: label.into(),
            instance,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instance(&self) -> Uuid {
        self.instance
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.instance)
    }
}

/// Immutable unit of data delivered by one fire call.
///
/// Equality is structural over topic, producer, payload and timestamp.
/// Build it with [`Envelope::builder`].
///
/// ```rust
/// use std::time::SystemTime;
/// use topicbus::{Envelope, ProducerId, Topic};
///
/// let topic = Topic::new("docs", "tick").unwrap();
/// let at = SystemTime::now();
/// let env = Envelope::builder(topic.clone(), ProducerId::new("clock"))
///     .with_payload(1_i64)
///     .with_timestamp(at)
///     .build();
///
/// assert_eq!(env.topic(), &topic);
/// assert_eq!(env.timestamp(), Some(at));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    topic: Topic,
    producer: ProducerId,
    #[serde(default)]
    payload: Option<Payload>,
    #[serde(default, with = "codec::timestamp")]
    timestamp: Option<SystemTime>,
}

impl Envelope {
    /// Starts building an envelope for `topic` fired by `producer`.
    pub fn builder(topic: Topic, producer: ProducerId) -> EnvelopeBuilder {
        EnvelopeBuilder::new(topic, producer)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn producer(&self) -> &ProducerId {
        &self.producer
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Timestamp of timed envelopes; `None` otherwise.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    pub fn is_timed(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Builder for [`Envelope`] with fluent API.
///
/// The single construction path for plain, timed and schema-checked
/// envelopes: pick `build` or `build_checked`, with or without a timestamp.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    topic: Topic,
    producer: ProducerId,
    payload: Option<Payload>,
    timestamp: Option<SystemTime>,
}

impl EnvelopeBuilder {
    pub fn new(topic: Topic, producer: ProducerId) -> Self {
        Self {
            topic,
            producer,
            payload: None,
            timestamp: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_timestamp(mut self, at: SystemTime) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Builds without looking at the topic schema.
    pub fn build(self) -> Envelope {
        Envelope {
            topic: self.topic,
            producer: self.producer,
            payload: self.payload,
            timestamp: self.timestamp,
        }
    }

    /// Builds after validating the payload against the topic schema.
    ///
    /// Topics without a schema always pass.
    pub fn build_checked(self) -> Result<Envelope, SchemaViolation> {
        self.topic.validate(self.payload.as_ref())?;
        Ok(self.build())
    }
}
