//! # Producer: the public face of one registry.
//!
//! The [`Producer`] owns a [`Registry`] and a [`ProducerConfig`]. Everything a
//! caller does (subscribe, unsubscribe, fire) goes through it.
//!
//! ## Key responsibilities
//! - serialize registry mutation behind the registry's single lock
//! - build envelopes (schema-checked or not, timed or not) for `fire*`
//! - run the dispatcher on the calling task, outside the lock
//!
//! ## High-level architecture
//! ```text
//! fire(topic, payload)
//!   ├─► Envelope::builder(topic, producer_id).with_payload(..)
//!   │         └─► build_checked()  (cfg.validate_payloads)  ── Err ──► SchemaViolation
//!   │         └─► registry.check_schema()  (schema subscribed under that name)
//!   └─► dispatch(&registry, &envelope, cfg.timeout())
//!             ├─► registry.snapshot(topic)        (lock held only here)
//!             ├─► listener.notify(&envelope) ...  (in snapshot order)
//!             └─► registry.remove(failed | reclaimed)
//!   ◄── payload echoed back unchanged
//! ```
//!
//! Cloning a `Producer` yields another handle to the **same** registry; a
//! listener that needs to call back into its producer should hold a
//! [`WeakProducer`] to avoid a reference cycle through the registry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use topicbus::{Envelope, Listener, ListenerError, Producer, Topic};
//!
//! struct Sum(AtomicI64);
//!
//! #[async_trait::async_trait]
//! impl Listener for Sum {
//!     async fn notify(&self, e: &Envelope) -> Result<(), ListenerError> {
//!         let v = e.payload().and_then(|p| p.as_i64()).unwrap_or(0);
//!         self.0.fetch_add(v, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let values = Topic::new("docs", "value")?;
//!     let producer = Producer::new("stats");
//!     let sum = Arc::new(Sum(AtomicI64::new(0)));
//!
//!     assert!(producer.subscribe(&values, sum.clone()));
//!     assert_eq!(producer.fire(&values, 40_i64).await?, 40);
//!     producer.fire(&values, 2_i64).await?;
//!
//!     assert_eq!(sum.0.load(Ordering::Relaxed), 42);
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use crate::core::{
    builder::ProducerBuilder,
    dispatch::{dispatch, DispatchReport},
    registry::{Position, Registry},
    ProducerConfig,
};
use crate::error::SchemaViolation;
use crate::listeners::{Listener, ListenerId, ListenerRef, RefKind};
use crate::messages::{Envelope, EnvelopeBuilder, Payload, ProducerId};
use crate::topics::Topic;

struct ProducerInner {
    id: ProducerId,
    cfg: ProducerConfig,
    registry: Registry,
}

/// Publishes envelopes to the listeners subscribed on it.
#[derive(Clone)]
pub struct Producer {
    inner: Arc<ProducerInner>,
}

impl Producer {
    /// Creates a producer with default configuration.
    pub fn new(label: impl Into<String>) -> Self {
        Self::builder(label).build()
    }

    /// Returns a builder for non-default configuration.
    pub fn builder(label: impl Into<String>) -> ProducerBuilder {
        ProducerBuilder::new(label)
    }

    pub(crate) fn new_internal(id: ProducerId, cfg: ProducerConfig) -> Self {
        Self {
            inner: Arc::new(ProducerInner {
                id,
                cfg,
                registry: Registry::new(),
            }),
        }
    }

    pub fn id(&self) -> &ProducerId {
        &self.inner.id
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.inner.cfg
    }

    /// Direct access to the underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Non-owning handle, for listeners that call back into this producer.
    pub fn downgrade(&self) -> WeakProducer {
        WeakProducer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ---------------------------
    // Subscriptions
    // ---------------------------

    /// Subscribes `listener` strongly, delivered after existing listeners.
    ///
    /// Returns `false` if it is already subscribed to `topic`.
    pub fn subscribe(&self, topic: &Topic, listener: Arc<dyn Listener>) -> bool {
        self.subscribe_with(topic, listener, Position::Last, RefKind::Strong)
    }

    /// Subscribes `listener` weakly: the caller must keep it alive.
    pub fn subscribe_weak(&self, topic: &Topic, listener: Arc<dyn Listener>) -> bool {
        self.subscribe_with(topic, listener, Position::Last, RefKind::Weak)
    }

    /// Subscribes with an explicit position and reference kind.
    ///
    /// Returns `false` for a duplicate or an index past the end.
    pub fn subscribe_with(
        &self,
        topic: &Topic,
        listener: Arc<dyn Listener>,
        position: Position,
        kind: RefKind,
    ) -> bool {
        self.inner
            .registry
            .subscribe(topic, ListenerRef::new(listener, kind), position)
    }

    /// Removes `listener` from `topic`; `false` if it was not subscribed.
    ///
    /// Accepts `&Arc<L>` or a [`ListenerId`] (`ListenerId::of(self)` inside a
    /// callback). An in-flight dispatch still delivers to it.
    pub fn unsubscribe(&self, topic: &Topic, listener: impl Into<ListenerId>) -> bool {
        self.inner.registry.unsubscribe(topic, listener.into())
    }

    /// Removes every subscription; returns how many were removed.
    pub fn unsubscribe_all(&self) -> usize {
        self.inner.registry.unsubscribe_all()
    }

    /// Removes every subscription whose listener matches `predicate`.
    pub fn unsubscribe_all_of_kind<F>(&self, predicate: F) -> usize
    where
        F: Fn(&dyn Listener) -> bool,
    {
        self.inner.registry.unsubscribe_all_of_kind(predicate)
    }

    /// Removes every subscription whose listener is of type `T`.
    pub fn unsubscribe_all_of<T: Listener>(&self) -> usize {
        self.inner.registry.unsubscribe_all_of::<T>()
    }

    pub fn has_listeners(&self) -> bool {
        self.inner.registry.has_listeners()
    }

    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.inner.registry.listener_count(topic)
    }

    pub fn topics_with_listeners(&self) -> HashSet<Topic> {
        self.inner.registry.topics_with_listeners()
    }

    // ---------------------------
    // Firing
    // ---------------------------

    /// Delivers `payload` on `topic` and hands it back unchanged.
    ///
    /// Fails only when validation is enabled and the payload violates the
    /// topic schema; in that case nothing is delivered.
    pub async fn fire<P>(&self, topic: &Topic, payload: P) -> Result<P, SchemaViolation>
    where
        P: Into<Payload> + Clone,
    {
        let builder = self.envelope(topic).with_payload(payload.clone());
        self.fire_built(builder).await?;
        Ok(payload)
    }

    /// Like [`fire`](Self::fire), with `at` carried in the envelope.
    pub async fn fire_timed<P>(
        &self,
        topic: &Topic,
        payload: P,
        at: SystemTime,
    ) -> Result<P, SchemaViolation>
    where
        P: Into<Payload> + Clone,
    {
        let builder = self
            .envelope(topic)
            .with_payload(payload.clone())
            .with_timestamp(at);
        self.fire_built(builder).await?;
        Ok(payload)
    }

    /// Fires an envelope without payload.
    pub async fn signal(&self, topic: &Topic) -> Result<(), SchemaViolation> {
        self.fire_built(self.envelope(topic)).await?;
        Ok(())
    }

    /// Delivers a caller-built envelope as is (no validation).
    pub async fn dispatch(&self, envelope: &Envelope) -> DispatchReport {
        dispatch(&self.inner.registry, envelope, self.inner.cfg.timeout()).await
    }

    fn envelope(&self, topic: &Topic) -> EnvelopeBuilder {
        Envelope::builder(topic.clone(), self.inner.id.clone())
    }

    async fn fire_built(&self, builder: EnvelopeBuilder) -> Result<DispatchReport, SchemaViolation> {
        let envelope = if self.inner.cfg.validate_payloads {
            builder
                .build_checked()
                .and_then(|envelope| self.inner.registry.check_schema(&envelope).map(|()| envelope))
                .inspect_err(|err| {
                    tracing::debug!(producer = %self.inner.id, label = err.as_label(), reason = %err, "fire rejected");
                })?
        } else {
            builder.build()
        };
        Ok(self.dispatch(&envelope).await)
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.inner.id)
            .field("cfg", &self.inner.cfg)
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// Non-owning handle to a [`Producer`].
#[derive(Clone)]
pub struct WeakProducer {
    inner: Weak<ProducerInner>,
}

impl WeakProducer {
    /// Returns the producer if it is still alive.
    pub fn upgrade(&self) -> Option<Producer> {
        self.inner.upgrade().map(|inner| Producer { inner })
    }
}

impl fmt::Debug for WeakProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakProducer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
