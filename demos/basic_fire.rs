//! # Example: basic_fire
//!
//! Demonstrates the local dispatch path.
//!
//! Shows how to:
//! - Declare topics with [`topic!`] and attach a [`Schema`].
//! - Subscribe strong and weak listeners.
//! - See a failing listener get unsubscribed while the others keep receiving.
//!
//! ## Flow
//! ```text
//! Producer::fire(topic, payload)
//!     ├─► Topic::validate(payload)          (schema)
//!     ├─► Registry::snapshot(topic)
//!     ├─► Printer.notify()       ─► Ok
//!     ├─► Flaky.notify()         ─► Err ─► unsubscribed
//!     └─► weak Printer reclaimed ─► pruned
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=topicbus=debug cargo run --example basic_fire
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use topicbus::{
    topic, Envelope, FieldKind, Listener, ListenerError, Payload, Producer, Schema,
};
use tracing_subscriber::EnvFilter;

/// Prints every envelope it receives.
struct Printer(&'static str);

#[async_trait::async_trait]
impl Listener for Printer {
    async fn notify(&self, e: &Envelope) -> Result<(), ListenerError> {
        println!("[{}] {} -> {:?}", self.0, e.topic(), e.payload());
        Ok(())
    }
}

/// Fails on its second envelope.
#[derive(Default)]
struct Flaky(AtomicUsize);

#[async_trait::async_trait]
impl Listener for Flaky {
    async fn notify(&self, _: &Envelope) -> Result<(), ListenerError> {
        match self.0.fetch_add(1, Ordering::Relaxed) {
            0 => Ok(()),
            n => Err(ListenerError::rejected(format!("gave up after {n} envelopes"))),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let moved = topic!("moved")?.with_schema(
        Schema::new()
            .field("x", FieldKind::Int)
            .field("y", FieldKind::Int),
    );
    let tick = topic!("tick")?;

    let producer = Producer::new("cursor");
    producer.subscribe(&moved, Arc::new(Printer("strong")));
    producer.subscribe(&moved, Arc::new(Flaky::default()));

    let weak = Arc::new(Printer("weak"));
    producer.subscribe_weak(&tick, weak.clone());

    for step in 0..3 {
        let pos = Payload::record([("x", step.into()), ("y", (step * 2).into())]);
        producer.fire(&moved, pos).await?;
        println!("moved listeners: {}", producer.listener_count(&moved));
    }

    if let Err(err) = producer.fire(&moved, "not a record").await {
        println!("rejected before delivery: {err}");
    }

    producer.signal(&tick).await?;
    drop(weak);
    producer.signal(&tick).await?;
    println!("tick listeners after reclaim: {}", producer.listener_count(&tick));

    Ok(())
}
