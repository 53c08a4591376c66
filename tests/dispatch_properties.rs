//! Dispatch guarantees exercised through the public API only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use topicbus::{
    Envelope, FieldKind, Listener, ListenerError, ListenerId, Payload, Position, Producer, RefKind,
    Schema, Topic, WeakProducer,
};

/// Appends its tag to a shared journal on every delivery.
struct Tagged {
    tag: &'static str,
    journal: Arc<Mutex<Vec<&'static str>>>,
}

impl Tagged {
    fn new(tag: &'static str, journal: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl Listener for Tagged {
    async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
        self.journal.lock().push(self.tag);
        Ok(())
    }
}

#[derive(Default)]
struct Counter(AtomicUsize);

impl Counter {
    fn hits(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Listener for Counter {
    async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct AlwaysFails;

#[async_trait]
impl Listener for AlwaysFails {
    async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
        Err(ListenerError::rejected("broken"))
    }
}

struct Panics;

#[async_trait]
impl Listener for Panics {
    async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
        panic!("listener bug");
    }
}

/// On first delivery: unsubscribes itself and subscribes `late`.
struct Rewirer {
    producer: WeakProducer,
    late: Arc<Counter>,
    hits: AtomicUsize,
    once: OnceLock<()>,
}

#[async_trait]
impl Listener for Rewirer {
    async fn notify(&self, e: &Envelope) -> Result<(), ListenerError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.once.set(()).is_ok() {
            if let Some(p) = self.producer.upgrade() {
                p.unsubscribe(e.topic(), ListenerId::of(self));
                p.subscribe(e.topic(), self.late.clone());
            }
        }
        Ok(())
    }
}

fn topic(name: &str) -> Topic {
    Topic::new("dispatch-properties", name).unwrap()
}

#[tokio::test]
async fn no_duplicate_subscriptions() {
    let producer = Producer::new("p");
    let t = topic("t");
    let l = Arc::new(Counter::default());

    assert!(producer.subscribe(&t, l.clone()));
    assert!(!producer.subscribe(&t, l.clone()));
    assert!(!producer.subscribe_weak(&t, l.clone()));
    assert_eq!(producer.listener_count(&t), 1);

    producer.fire(&t, 1).await.unwrap();
    assert_eq!(l.hits(), 1);
}

#[tokio::test]
async fn delivery_follows_subscription_order() {
    let producer = Producer::new("p");
    let t = topic("t");
    let journal = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        producer.subscribe(&t, Tagged::new(tag, &journal));
    }

    producer.signal(&t).await.unwrap();
    assert_eq!(*journal.lock(), ["a", "b", "c"]);
}

#[tokio::test]
async fn explicit_positions_are_honored() {
    let producer = Producer::new("p");
    let t = topic("t");
    let journal = Arc::new(Mutex::new(Vec::new()));

    producer.subscribe(&t, Tagged::new("a", &journal));
    producer.subscribe(&t, Tagged::new("b", &journal));
    assert!(producer.subscribe_with(&t, Tagged::new("c", &journal), Position::First, RefKind::Strong));
    assert!(producer.subscribe_with(&t, Tagged::new("d", &journal), Position::Index(2), RefKind::Strong));
    assert!(!producer.subscribe_with(&t, Tagged::new("e", &journal), Position::Index(9), RefKind::Strong));

    producer.signal(&t).await.unwrap();
    assert_eq!(*journal.lock(), ["c", "a", "d", "b"]);
}

#[tokio::test]
async fn listeners_may_rewire_during_dispatch() {
    let producer = Producer::new("p");
    let t = topic("t");
    let late = Arc::new(Counter::default());
    let rewirer = Arc::new(Rewirer {
        producer: producer.downgrade(),
        late: late.clone(),
        hits: AtomicUsize::new(0),
        once: OnceLock::new(),
    });
    let tail = Arc::new(Counter::default());
    producer.subscribe(&t, rewirer.clone());
    producer.subscribe(&t, tail.clone());

    producer.fire(&t, 1).await.unwrap();
    // the snapshot taken at fire time still reaches the tail, not the newcomer
    assert_eq!(rewirer.hits.load(Ordering::SeqCst), 1);
    assert_eq!(tail.hits(), 1);
    assert_eq!(late.hits(), 0);

    producer.fire(&t, 2).await.unwrap();
    assert_eq!(rewirer.hits.load(Ordering::SeqCst), 1);
    assert_eq!(tail.hits(), 2);
    assert_eq!(late.hits(), 1);
}

#[tokio::test]
async fn reclaimed_weak_listeners_are_pruned_by_next_fire() {
    let producer = Producer::new("p");
    let t = topic("t");
    let weak = Arc::new(Counter::default());
    let strong = Arc::new(Counter::default());
    producer.subscribe_weak(&t, weak.clone());
    producer.subscribe(&t, strong.clone());

    producer.signal(&t).await.unwrap();
    assert_eq!(weak.hits(), 1);

    drop(weak);
    assert_eq!(producer.listener_count(&t), 2);

    let report = producer
        .dispatch(&Envelope::builder(t.clone(), producer.id().clone()).build())
        .await;
    assert_eq!((report.delivered, report.pruned, report.failed), (1, 1, 0));
    assert_eq!(producer.listener_count(&t), 1);
    assert_eq!(strong.hits(), 2);
}

#[tokio::test]
async fn failing_listeners_are_contained_and_removed() {
    let producer = Producer::new("p");
    let t = topic("t");
    let before = Arc::new(Counter::default());
    let after = Arc::new(Counter::default());
    producer.subscribe(&t, before.clone());
    producer.subscribe(&t, Arc::new(AlwaysFails));
    producer.subscribe(&t, Arc::new(Panics));
    producer.subscribe(&t, after.clone());

    assert_eq!(producer.fire(&t, "x").await.unwrap(), "x");
    assert_eq!(before.hits(), 1);
    assert_eq!(after.hits(), 1);
    assert_eq!(producer.listener_count(&t), 2);

    producer.fire(&t, "y").await.unwrap();
    assert_eq!(after.hits(), 2);
}

#[tokio::test]
async fn schema_gates_fire() {
    let producer = Producer::new("p");
    let moved = topic("moved").with_schema(Schema::new().field("x", FieldKind::Int));
    let l = Arc::new(Counter::default());
    producer.subscribe(&moved, l.clone());

    let err = producer
        .fire(&moved, Payload::record([("x", "abc".into())]))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "schema_wrong_type");
    assert_eq!(l.hits(), 0);

    producer
        .fire(&moved, Payload::record([("x", 5.into())]))
        .await
        .unwrap();
    assert_eq!(l.hits(), 1);
}

#[tokio::test]
async fn fire_without_listeners_is_a_no_op() {
    let producer = Producer::new("p");
    let t = topic("nobody");

    assert_eq!(producer.fire(&t, 42_i64).await.unwrap(), 42_i64);
    producer.signal(&t).await.unwrap();
    assert!(!producer.has_listeners());
    assert!(producer.topics_with_listeners().is_empty());
}

#[tokio::test]
async fn schema_follows_the_topic_name() {
    let producer = Producer::new("p");
    let l = Arc::new(Counter::default());
    producer.subscribe(&topic("moved"), l.clone());
    producer.subscribe(
        &topic("moved").with_schema(Schema::new().field("x", FieldKind::Int)),
        Arc::new(Counter::default()),
    );

    assert!(producer.fire(&topic("moved"), "not a record").await.is_err());
    assert_eq!(l.hits(), 0);
    producer
        .fire(&topic("moved"), Payload::record([("x", 1.into())]))
        .await
        .unwrap();
    assert_eq!(l.hits(), 1);
}

#[tokio::test]
async fn unsubscribe_all_of_kind_filters_by_predicate() {
    let producer = Producer::new("p");
    let a = topic("a");
    let b = topic("b");
    let keep = Arc::new(Counter::default());
    producer.subscribe(&a, Arc::new(AlwaysFails));
    producer.subscribe(&b, Arc::new(AlwaysFails));
    producer.subscribe(&b, keep.clone());

    assert_eq!(producer.unsubscribe_all_of_kind(|l| l.name() == "nobody"), 0);
    assert_eq!(producer.unsubscribe_all_of::<AlwaysFails>(), 2);
    assert_eq!(producer.topics_with_listeners().len(), 1);
    assert_eq!(producer.unsubscribe_all(), 1);
    assert!(!producer.has_listeners());
}
