//! # Subscription registry - per-producer topic → listener list.
//!
//! The registry owns every subscription of one producer:
//! - `subscribe` inserts a [`ListenerRef`] at the requested [`Position`]
//! - `unsubscribe` removes it by listener identity
//! - `snapshot` hands the dispatcher a private copy of one topic's list
//! - `remove` lets the dispatcher reap exactly the entry it snapshotted
//!
//! ## Architecture
//! ```text
//! Mutex<HashMap<Topic, Vec<Subscription>>>
//!     "app/moved" ──► [ S#1 (strong) , S#4 (weak) , S#2 (strong) ]
//!     "app/tick"  ──► [ S#3 (strong) ]
//! ```
//!
//! ## Rules
//! - One lock per registry; never held while a listener runs.
//! - A topic whose list becomes empty is dropped from the map.
//! - At most one subscription per `(topic, listener identity)`.
//! - The map key carries the first schema subscribed under that topic name; a
//!   typed subscription replaces a schemaless key, never another schema.
//! - Removed entries are dropped **after** the lock is released: dropping the
//!   last strong `Arc` runs the listener's `Drop`, which may call back in.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use parking_lot::Mutex;

use crate::error::SchemaViolation;
use crate::listeners::{Listener, ListenerId, ListenerRef};
use crate::messages::Envelope;
use crate::topics::Topic;

/// Global counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Where a new subscription goes in its topic's delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Delivered before every existing subscriber.
    First,
    /// Delivered after every existing subscriber.
    #[default]
    Last,
    /// Inserted at this index; must be `<=` the current listener count.
    Index(usize),
}

/// Unique id of one subscription (never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        SubscriptionId(SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// One listener bound to one topic.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    listener: ListenerRef,
}

impl Subscription {
    /// Id assigned when the subscription was made.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Strong or weak handle of the subscribed listener.
    pub fn listener(&self) -> &ListenerRef {
        &self.listener
    }
}

/// Topic-keyed subscription store owned by a single producer.
#[derive(Debug, Default)]
pub struct Registry {
    topics: Mutex<HashMap<Topic, Vec<Subscription>>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` to `topic` at `position`.
    ///
    /// Returns `false` if the same listener is already subscribed to `topic`,
    /// or if `position` is an index past the end of the list.
    pub fn subscribe(&self, topic: &Topic, listener: ListenerRef, position: Position) -> bool {
        let mut topics = self.topics.lock();
        let untyped_key = topic.schema().is_some()
            && topics
                .get_key_value(topic)
                .is_some_and(|(key, _)| key.schema().is_none());
        if untyped_key {
            // `insert` keeps an existing key, so take the entry out first.
            if let Some(subs) = topics.remove(topic) {
                topics.insert(topic.clone(), subs);
            }
        }
        let subs = topics.entry(topic.clone()).or_default();

        let duplicate = subs.iter().any(|s| s.listener.id() == listener.id());
        let index = match position {
            Position::First => Some(0),
            Position::Last => Some(subs.len()),
            Position::Index(i) if i <= subs.len() => Some(i),
            Position::Index(_) => None,
        };

        let Some(index) = index.filter(|_| !duplicate) else {
            if subs.is_empty() {
                topics.remove(topic);
            }
            drop(topics);
            tracing::debug!(
                %topic,
                listener = listener.name(),
                duplicate,
                ?position,
                "subscription rejected"
            );
            return false;
        };

        let id = SubscriptionId::next();
        let name = listener.name();
        let kind = listener.kind();
        subs.insert(index, Subscription { id, listener });
        drop(topics);

        tracing::debug!(%topic, listener = name, ?kind, index, subscription = id.0, "subscribed");
        true
    }

    /// Removes the subscription of `listener` on `topic`.
    ///
    /// Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, topic: &Topic, listener: ListenerId) -> bool {
        let removed = self.take_where(topic, |s| s.listener.id() == listener);
        if let Some(sub) = &removed {
            tracing::debug!(%topic, listener = sub.listener.name(), "unsubscribed");
        }
        removed.is_some()
    }

    /// Removes the exact subscription `id` from `topic`.
    ///
    /// Used by the dispatcher to reap failed or reclaimed entries without
    /// touching a newer subscription of the same listener.
    pub fn remove(&self, topic: &Topic, id: SubscriptionId) -> bool {
        self.take_where(topic, |s| s.id == id).is_some()
    }

    /// Removes every subscription; returns how many there were.
    pub fn unsubscribe_all(&self) -> usize {
        let drained: Vec<Vec<Subscription>> = {
            let mut topics = self.topics.lock();
            topics.drain().map(|(_, subs)| subs).collect()
        };
        let count = drained.iter().map(Vec::len).sum();
        tracing::debug!(count, "unsubscribed all");
        count
    }

    /// Removes every subscription whose listener matches `predicate`.
    ///
    /// Reclaimed weak entries are pruned on the way but not counted. The
    /// predicate runs without the lock held.
    pub fn unsubscribe_all_of_kind<F>(&self, predicate: F) -> usize
    where
        F: Fn(&dyn Listener) -> bool,
    {
        let entries: Vec<(Topic, Subscription)> = {
            let topics = self.topics.lock();
            topics
                .iter()
                .flat_map(|(t, subs)| subs.iter().map(move |s| (t.clone(), s.clone())))
                .collect()
        };

        let mut matched = 0;
        for (topic, sub) in &entries {
            match sub.listener.resolve() {
                Some(listener) if predicate(listener.as_ref()) => {
                    if self.remove(topic, sub.id) {
                        matched += 1;
                    }
                }
                Some(_) => {}
                None => {
                    self.remove(topic, sub.id);
                }
            }
        }
        tracing::debug!(count = matched, "unsubscribed by predicate");
        matched
    }

    /// Removes every subscription whose listener is of type `T`.
    ///
    /// Unlike matching on [`Listener::name`], this cannot be fooled by two
    /// types sharing a name.
    pub fn unsubscribe_all_of<T: Listener>(&self) -> usize {
        self.unsubscribe_all_of_kind(|l| l.concrete_type() == TypeId::of::<T>())
    }

    /// Checks `envelope` against the schema registered for its topic.
    ///
    /// Topics compare by origin and name only, so an envelope may carry a
    /// schemaless (or differently typed) handle of a topic subscribed with a
    /// schema. The stored schema is the one listeners were promised.
    pub fn check_schema(&self, envelope: &Envelope) -> Result<(), SchemaViolation> {
        let stored = self
            .topics
            .lock()
            .get_key_value(envelope.topic())
            .map(|(key, _)| key.clone());
        match stored {
            Some(key) if key.schema().is_some() && key.schema() != envelope.topic().schema() => {
                key.validate(envelope.payload())
            }
            _ => Ok(()),
        }
    }

    /// Number of subscriptions on `topic`.
    ///
    /// Reclaimed weak entries are counted until a dispatch (or [`prune`](Self::prune))
    /// removes them.
    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Whether any topic has at least one subscription.
    pub fn has_listeners(&self) -> bool {
        !self.topics.lock().is_empty()
    }

    /// Topics with at least one subscription (a copy, safe to keep).
    pub fn topics_with_listeners(&self) -> HashSet<Topic> {
        self.topics.lock().keys().cloned().collect()
    }

    /// Point-in-time copy of `topic`'s subscriptions, in delivery order.
    pub fn snapshot(&self, topic: &Topic) -> Vec<Subscription> {
        self.topics.lock().get(topic).cloned().unwrap_or_default()
    }

    /// Drops reclaimed weak entries of `topic`; returns how many.
    pub fn prune(&self, topic: &Topic) -> usize {
        let mut reclaimed = Vec::new();
        {
            let mut topics = self.topics.lock();
            if let Some(subs) = topics.get_mut(topic) {
                let (dead, live): (Vec<_>, Vec<_>) = std::mem::take(subs)
                    .into_iter()
                    .partition(|s| s.listener.is_reclaimed());
                *subs = live;
                reclaimed = dead;
                if subs.is_empty() {
                    topics.remove(topic);
                }
            }
        }
        reclaimed.len()
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    /// Removes the first subscription of `topic` matching `pred`.
    ///
    /// The returned value is dropped by the caller, outside the lock.
    fn take_where<F>(&self, topic: &Topic, pred: F) -> Option<Subscription>
    where
        F: Fn(&Subscription) -> bool,
    {
        let mut topics = self.topics.lock();
        let subs = topics.get_mut(topic)?;
        let pos = subs.iter().position(pred)?;
        let removed = subs.remove(pos);
        if subs.is_empty() {
            topics.remove(topic);
        }
        Some(removed)
    }
}
