//! # topicbus
//!
//! **Topicbus** is a small in-process publish/subscribe core for Rust.
//!
//! A [`Producer`] owns a registry of listeners per [`Topic`]. Firing a topic
//! wraps the payload in an [`Envelope`] and delivers it to every listener
//! subscribed at that moment, in subscription order. A listener that fails
//! is unsubscribed; the others still get the envelope.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Listener   │   │   Listener   │   │RemoteListener│
//!     │   (strong)   │   │    (weak)    │   │  (adapter)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ subscribe        ▼ subscribe        ▼ subscribe
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Producer                                                         │
//! │  - ProducerId (label + instance uuid)                             │
//! │  - ProducerConfig (notify timeout, payload validation)            │
//! │  - Registry (topic ─► ordered subscriptions, one lock)            │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ fire(topic, payload)
//!        ▼
//!   validate payload against Topic schema ──► Err(SchemaViolation)
//!        │ ok
//!        ▼
//!   Envelope { topic, producer, payload, timestamp }
//!        │
//!        ▼
//!   snapshot subscriptions (lock held only here)
//!        │
//!        ├─► weak reference reclaimed ──► prune
//!        ├─► notify().await ──► Ok            ──► delivered
//!        └─► notify().await ──► Err / panic   ──► unsubscribe, continue
//!                               / timeout
//! ```
//!
//! ### Remote delivery
//! ```text
//! Producer ──► RemoteListener ══ TCP, length-prefixed JSON ══► RemoteEndpoint ──► Listener
//!                    ▲                                              │
//!                    └─────────────── Ack / Nack ◄──────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Topics**        | Named, origin-scoped channels with optional payload schemas.  | [`Topic`], [`Schema`], [`topic!`]          |
//! | **Listeners**     | Receivers held strongly or weakly.                            | [`Listener`], [`ListenerRef`], [`RefKind`] |
//! | **Messages**      | Typed payloads in envelopes.                                  | [`Payload`], [`Envelope`]                  |
//! | **Dispatch**      | Subscribe, fire, failure containment.                         | [`Producer`], [`Registry`]                 |
//! | **Remote**        | Listeners in another process.                                 | [`RemoteEndpoint`], [`RemoteListener`]     |
//! | **Errors**        | Typed errors with stable log labels.                          | [`SchemaViolation`], [`ListenerError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogListener`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use topicbus::{Envelope, FieldKind, Listener, ListenerError, Payload, Producer, Schema};
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl Listener for Printer {
//!     async fn notify(&self, e: &Envelope) -> Result<(), ListenerError> {
//!         println!("{} -> {:?}", e.topic(), e.payload());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let moved = topicbus::topic!("moved")?
//!         .with_schema(Schema::new().field("x", FieldKind::Int).field("y", FieldKind::Int));
//!
//!     let producer = Producer::new("cursor");
//!     producer.subscribe(&moved, Arc::new(Printer));
//!
//!     producer
//!         .fire(&moved, Payload::record([("x", 3.into()), ("y", 4.into())]))
//!         .await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod listeners;
mod messages;
mod remote;
mod topics;

// ---- Public re-exports ----

pub use core::{
    DispatchReport, Position, Producer, ProducerBuilder, ProducerConfig, Registry, Subscription,
    SubscriptionId, WeakProducer,
};
pub use error::{ListenerError, RemoteError, SchemaViolation, TopicError};
pub use listeners::{Listener, ListenerId, ListenerRef, RefKind};
pub use messages::{Envelope, EnvelopeBuilder, Payload, ProducerId};
pub use remote::{
    RemoteConfig, RemoteEndpoint, RemoteListener, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT, MAX_FRAME_SIZE,
};
pub use topics::{Field, FieldKind, Schema, Topic};

// Optional: expose a simple built-in logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogListener;
