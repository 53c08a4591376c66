//! # Listeners and the handles the registry keeps for them.
//!
//! ## Architecture
//! ```text
//! Producer::subscribe(topic, Arc<dyn Listener>, position, kind)
//!     │
//!     └──► ListenerRef ──┬── Strong(Arc<dyn Listener>)   registry keeps it alive
//!                        └── Weak(Weak<dyn Listener>)    caller keeps it alive
//!
//! dispatch:
//!   ListenerRef::resolve()
//!     ├── Some(listener) ──► listener.notify(&Envelope)
//!     └── None           ──► reclaimed, pruned from the registry
//! ```
//!
//! ## Implementing a listener
//! ```no_run
//! use topicbus::{Envelope, Listener, ListenerError};
//! use async_trait::async_trait;
//!
//! struct Counter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Listener for Counter {
//!     async fn notify(&self, _envelope: &Envelope) -> Result<(), ListenerError> {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//! ```

mod listener;
#[cfg(feature = "logging")]
mod log;
mod reference;

pub use listener::{Listener, ListenerId};
#[cfg(feature = "logging")]
pub use log::LogListener;
pub use reference::{ListenerRef, RefKind};
