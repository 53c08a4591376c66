//! # LogListener: traces every envelope it receives
//!
//! A minimal listener that emits one `tracing` event per envelope.
//! Use it for tests or demos.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO topicbus::listeners::log: envelope topic=app/moved producer=grid#5f0c… payload=Some(Record({"x": Int(5)}))
//! INFO topicbus::listeners::log: envelope topic=app/tick producer=clock#91aa… payload=None timed=true
//! ```

use async_trait::async_trait;
use tracing::Level;

use crate::error::ListenerError;
use crate::listeners::Listener;
use crate::messages::Envelope;

/// Envelope tracing listener.
#[derive(Debug, Clone)]
pub struct LogListener {
    level: Level,
}

impl LogListener {
    /// Construct a new [`LogListener`] logging at `INFO`.
    #[must_use]
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Log at `level` instead.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for LogListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LogListener {
    async fn notify(&self, e: &Envelope) -> Result<(), ListenerError> {
        let topic = e.topic().to_string();
        let producer = e.producer().to_string();
        let payload = format!("{:?}", e.payload());
        let timed = e.is_timed();

        // `tracing` macros need the level as a constant.
        match self.level {
            Level::ERROR => tracing::error!(%topic, %producer, %payload, timed, "envelope"),
            Level::WARN => tracing::warn!(%topic, %producer, %payload, timed, "envelope"),
            Level::INFO => tracing::info!(%topic, %producer, %payload, timed, "envelope"),
            Level::DEBUG => tracing::debug!(%topic, %producer, %payload, timed, "envelope"),
            _ => tracing::trace!(%topic, %producer, %payload, timed, "envelope"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogListener"
    }
}
