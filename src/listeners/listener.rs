//! # Core listener trait
//!
//! `Listener` is the extension point for receiving envelopes. The dispatcher
//! awaits `notify` for each subscribed listener in subscription order, on the
//! task that called `fire`.
//!
//! ## Contract
//! - Returning `Err` (or panicking) counts as a delivery failure: the listener is
//!   unsubscribed from that topic and delivery continues with the next one.
//! - `notify` may call back into the producer (subscribe, unsubscribe, fire);
//!   the registry lock is never held while listeners run.
//! - Slow listeners stall the firer. Configure
//!   [`ProducerConfig::notify_timeout`](crate::ProducerConfig::notify_timeout)
//!   to turn a stall into a delivery failure.
//!
//! ## Example (skeleton)
//! ```rust
//! use topicbus::{Envelope, Listener, ListenerError};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Listener for Audit {
//!     async fn notify(&self, envelope: &Envelope) -> Result<(), ListenerError> {
//!         let _ = envelope.payload();
//!         Ok(())
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use std::any::TypeId;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::messages::Envelope;

/// Contract for envelope receivers.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handle one envelope.
    ///
    /// # Parameters
    /// - `envelope`: Reference to the envelope (does not transfer ownership)
    async fn notify(&self, envelope: &Envelope) -> Result<(), ListenerError>;

    /// Human-readable name (for logs).
    ///
    /// Free-form and overridable, so not an identity: remove listeners by
    /// type with [`Producer::unsubscribe_all_of`](crate::Producer::unsubscribe_all_of).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// `TypeId` of the implementing type; backs type-based unsubscription.
    #[doc(hidden)]
    fn concrete_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Identity of a subscribed listener.
///
/// Two ids are equal when they point at the same listener value. Take it from
/// the `Arc` that was subscribed, or from `self` inside a callback:
///
/// ```rust
/// use std::sync::Arc;
/// use topicbus::{Envelope, Listener, ListenerError, ListenerId};
///
/// struct Once;
///
/// #[async_trait::async_trait]
/// impl Listener for Once {
///     async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
///         let _me = ListenerId::of(self);
///         Ok(())
///     }
/// }
///
/// let l = Arc::new(Once);
/// assert_eq!(ListenerId::from(&l), ListenerId::of(&*l));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Identity of the value behind `listener`.
    pub fn of<L: ?Sized>(listener: &L) -> Self {
        ListenerId(listener as *const L as *const () as usize)
    }
}

impl<L: ?Sized> From<&Arc<L>> for ListenerId {
    fn from(listener: &Arc<L>) -> Self {
        ListenerId(Arc::as_ptr(listener) as *const () as usize)
    }
}
