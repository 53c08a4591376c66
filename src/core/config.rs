//! # Producer configuration.
//!
//! Provides [`ProducerConfig`], the settings a [`Producer`](crate::Producer)
//! applies to every fire call.
//!
//! ## Sentinel values
//! - `notify_timeout = 0s` → no per-listener timeout (a hanging listener stalls the firer)

use std::time::Duration;

/// Configuration of one producer.
///
/// ## Field semantics
/// - `notify_timeout`: upper bound for a single `notify` call (`0s` = unbounded)
/// - `validate_payloads`: check payloads against topic schemas in `fire*`
#[derive(Clone, Debug)]
pub struct ProducerConfig {
    /// Maximum time one listener may take to handle one envelope.
    ///
    /// Expiry is treated like any other delivery failure: the listener is
    /// unsubscribed and delivery moves on.
    pub notify_timeout: Duration,

    /// Whether `fire`, `fire_timed` and `signal` build schema-checked envelopes.
    ///
    /// [`Producer::dispatch`](crate::Producer::dispatch) never validates: the
    /// caller chose how to build that envelope.
    pub validate_payloads: bool,
}

impl ProducerConfig {
    /// Returns the per-listener timeout as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(d)` → each `notify` call is cut off after `d`
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        if self.notify_timeout == Duration::ZERO {
            None
        } else {
            Some(self.notify_timeout)
        }
    }
}

impl Default for ProducerConfig {
    /// Default configuration:
    ///
    /// - `notify_timeout = 0s` (unbounded)
    /// - `validate_payloads = true`
    fn default() -> Self {
        Self {
            notify_timeout: Duration::ZERO,
            validate_payloads: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let mut cfg = ProducerConfig::default();
        assert_eq!(cfg.timeout(), None);
        cfg.notify_timeout = Duration::from_millis(250);
        assert_eq!(cfg.timeout(), Some(Duration::from_millis(250)));
    }
}
