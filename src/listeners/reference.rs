//! # Strong and weak listener handles.
//!
//! A [`ListenerRef`] is what the registry actually stores:
//! - **Strong**: the registry keeps the listener alive until it is unsubscribed.
//! - **Weak**: the registry does not keep the listener alive. Once every other
//!   `Arc` is dropped, [`ListenerRef::resolve`] returns `None` and the next
//!   dispatch on that topic prunes the entry.
//!
//! The identity is computed once at construction. A `Weak` keeps the
//! allocation (not the value) alive, so the id can't be reused by another
//! listener while the handle exists.

use std::fmt;
use std::sync::{Arc, Weak};

use super::{Listener, ListenerId};

/// How the registry holds a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefKind {
    /// The registry owns a strong `Arc`.
    #[default]
    Strong,
    /// The registry owns a `Weak`; the listener may be reclaimed at any time.
    Weak,
}

#[derive(Clone)]
enum Handle {
    Strong(Arc<dyn Listener>),
    Weak(Weak<dyn Listener>),
}

/// Handle to a subscriber, held strongly or weakly.
#[derive(Clone)]
pub struct ListenerRef {
    id: ListenerId,
    name: &'static str,
    handle: Handle,
}

impl ListenerRef {
    pub fn new(listener: Arc<dyn Listener>, kind: RefKind) -> Self {
        match kind {
            RefKind::Strong => Self::strong(listener),
            RefKind::Weak => Self::weak(listener),
        }
    }

    /// Keeps `listener` alive for as long as this handle exists.
    pub fn strong(listener: Arc<dyn Listener>) -> Self {
        Self {
            id: ListenerId::from(&listener),
            name: listener.name(),
            handle: Handle::Strong(listener),
        }
    }

    /// Downgrades `listener`; the caller must keep its own `Arc` alive.
    pub fn weak(listener: Arc<dyn Listener>) -> Self {
        Self {
            id: ListenerId::from(&listener),
            name: listener.name(),
            handle: Handle::Weak(Arc::downgrade(&listener)),
        }
    }

    /// Returns the listener, or `None` if a weak handle was reclaimed.
    pub fn resolve(&self) -> Option<Arc<dyn Listener>> {
        match &self.handle {
            Handle::Strong(l) => Some(Arc::clone(l)),
            Handle::Weak(w) => w.upgrade(),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Listener name captured at construction (still available once reclaimed).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> RefKind {
        match self.handle {
            Handle::Strong(_) => RefKind::Strong,
            Handle::Weak(_) => RefKind::Weak,
        }
    }

    /// True for a weak handle whose listener is gone.
    pub fn is_reclaimed(&self) -> bool {
        match &self.handle {
            Handle::Strong(_) => false,
            Handle::Weak(w) => w.strong_count() == 0,
        }
    }
}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("reclaimed", &self.is_reclaimed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;
    use crate::messages::Envelope;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Listener for Noop {
        async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "noop"
        }
    }

    #[test]
    fn test_strong_keeps_listener_alive() {
        let listener = Arc::new(Noop);
        let id = ListenerId::from(&listener);
        let r = ListenerRef::strong(listener);
        assert_eq!(r.kind(), RefKind::Strong);
        assert_eq!(r.id(), id);
        assert!(r.resolve().is_some());
        assert!(!r.is_reclaimed());
    }

    #[test]
    fn test_weak_resolves_until_dropped() {
        let listener = Arc::new(Noop);
        let r = ListenerRef::new(listener.clone(), RefKind::Weak);
        assert_eq!(r.kind(), RefKind::Weak);
        assert!(r.resolve().is_some());

        drop(listener);
        assert!(r.resolve().is_none());
        assert!(r.is_reclaimed());
        assert_eq!(r.name(), "noop");
    }

    #[test]
    fn test_identity_matches_value_address() {
        let a = Arc::new(Noop);
        let b = Arc::new(Noop);
        let ra = ListenerRef::strong(a.clone());
        assert_eq!(ra.id(), ListenerId::of(&*a));
        assert_ne!(ra.id(), ListenerId::from(&b));
    }
}
