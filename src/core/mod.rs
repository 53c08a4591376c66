//! Dispatch core: registry, dispatcher and the producer façade.
//!
//! The public entry point is [`Producer`]; [`Registry`] and the types it
//! exposes are public for callers that want to inspect subscriptions directly.
//!
//! Internal modules:
//! - [`registry`]: topic → ordered subscriptions, one lock per producer;
//! - [`dispatch`]: snapshot, deliver outside the lock, reap failures;
//! - [`producer`]: subscribe/unsubscribe/fire façade;
//! - [`builder`]: producer construction with non-default settings;
//! - [`config`]: producer settings.

mod builder;
mod config;
mod dispatch;
mod producer;
mod registry;

pub use builder::ProducerBuilder;
pub use config::ProducerConfig;
pub use dispatch::DispatchReport;
pub use producer::{Producer, WeakProducer};
pub use registry::{Position, Registry, Subscription, SubscriptionId};
