use std::time::Duration;

use crate::core::ProducerConfig;
use crate::messages::ProducerId;

use super::producer::Producer;

/// Builder for constructing a [`Producer`] with non-default settings.
pub struct ProducerBuilder {
    id: ProducerId,
    cfg: ProducerConfig,
}

impl ProducerBuilder {
    /// Creates a new builder; the producer id gets a fresh instance uuid.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: ProducerId::new(label),
            cfg: ProducerConfig::default(),
        }
    }

    /// Uses an existing identity instead of generating one.
    pub fn with_id(mut self, id: ProducerId) -> Self {
        self.id = id;
        self
    }

    pub fn with_config(mut self, cfg: ProducerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Shorthand for setting [`ProducerConfig::notify_timeout`].
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.notify_timeout = timeout;
        self
    }

    /// Shorthand for setting [`ProducerConfig::validate_payloads`].
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.cfg.validate_payloads = validate;
        self
    }

    /// Builds the producer with an empty registry.
    pub fn build(self) -> Producer {
        Producer::new_internal(self.id, self.cfg)
    }
}
