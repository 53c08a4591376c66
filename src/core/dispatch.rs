//! # Deliver one envelope to the current subscribers of its topic.
//!
//! - **Snapshot** the topic's subscriptions (registry lock taken and released)
//! - **Deliver** to each entry in snapshot order, awaiting `notify`
//! - **Reap** reclaimed weak entries and failed listeners from the live registry
//!
//! ## Flow
//! ```text
//! snapshot(topic) ──► [S1, S2, S3]            (lock released here)
//!   S1: resolve() ── None          ──► registry.remove(S1)   pruned
//!   S2: resolve() ── Some(l) ──► l.notify(&env)
//!                                  ├─ Ok(())                 delivered
//!                                  └─ Err / panic / timeout ──► registry.remove(S2)  failed
//!   S3: ...
//! ```
//!
//! ## Rules
//! - Delivery order equals the snapshot order.
//! - Listeners may subscribe/unsubscribe while being notified; changes apply to
//!   the **next** dispatch, never to the one in flight.
//! - Failures are logged and contained; nothing reaches the caller.
//! - Reaping removes by subscription id, so a listener that re-subscribed
//!   meanwhile keeps its new subscription.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::core::registry::Registry;
use crate::error::ListenerError;
use crate::listeners::Listener;
use crate::messages::Envelope;

/// Outcome counters of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners whose `notify` returned `Ok`.
    pub delivered: usize,
    /// Weak entries found reclaimed and removed.
    pub pruned: usize,
    /// Listeners that failed and were unsubscribed.
    pub failed: usize,
}

impl DispatchReport {
    /// Snapshot entries processed.
    pub fn total(&self) -> usize {
        self.delivered + self.pruned + self.failed
    }
}

/// Delivers `envelope` to the subscribers of its topic in `registry`.
///
/// `timeout` bounds each individual `notify` call; expiry is a delivery failure.
pub(crate) async fn dispatch(
    registry: &Registry,
    envelope: &Envelope,
    timeout: Option<Duration>,
) -> DispatchReport {
    let topic = envelope.topic();
    let snapshot = registry.snapshot(topic);
    let mut report = DispatchReport::default();

    for sub in snapshot {
        let Some(listener) = sub.listener().resolve() else {
            registry.remove(topic, sub.id());
            report.pruned += 1;
            tracing::debug!(%topic, listener = sub.listener().name(), "pruned reclaimed listener");
            continue;
        };

        match deliver(listener.as_ref(), envelope, timeout).await {
            Ok(()) => {
                report.delivered += 1;
                tracing::trace!(%topic, listener = listener.name(), "delivered");
            }
            Err(err) => {
                registry.remove(topic, sub.id());
                report.failed += 1;
                tracing::warn!(
                    %topic,
                    listener = listener.name(),
                    producer = %envelope.producer(),
                    label = err.as_label(),
                    reason = %err,
                    "delivery failed; listener unsubscribed"
                );
            }
        }
    }

    report
}

/// Runs one `notify`, turning panics and timeouts into [`ListenerError`].
async fn deliver(
    listener: &dyn Listener,
    envelope: &Envelope,
    timeout: Option<Duration>,
) -> Result<(), ListenerError> {
    let fut = AssertUnwindSafe(listener.notify(envelope)).catch_unwind();

    let outcome = match timeout {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => return Err(ListenerError::Timeout { timeout: dur }),
        },
        None => fut.await,
    };

    outcome.unwrap_or_else(|panic_err| {
        let any = &*panic_err;
        let info = if let Some(msg) = any.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = any.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Err(ListenerError::Panicked { info })
    })
}
