//! # Example: remote_listener
//!
//! Exports a [`LogListener`] over TCP and fires into it through a
//! [`RemoteListener`] adapter.
//!
//! ## Flow
//! ```text
//! Producer::fire() ──► RemoteListener ──Notify──► RemoteEndpoint ──► LogListener
//!                            ▲                           │
//!                            └──────────── Ack ──────────┘
//! ```
//!
//! After the endpoint shuts down the next fire fails on the transport and
//! the adapter is unsubscribed.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example remote_listener --features logging
//! ```

use std::sync::Arc;

use topicbus::{
    topic, LogListener, Payload, Producer, RemoteConfig, RemoteEndpoint, RemoteListener,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = RemoteConfig::local();
    let endpoint = RemoteEndpoint::export(Arc::new(LogListener::default()), &cfg).await?;
    println!("endpoint listening on {}", endpoint.local_addr());

    let temperature = topic!("temperature")?;
    let producer = Producer::new("thermometer");
    let adapter = RemoteListener::connect(endpoint.local_addr(), &cfg).await?;
    producer.subscribe(&temperature, Arc::new(adapter));

    for reading in [20.5_f64, 21.0, 21.25] {
        producer
            .fire(&temperature, Payload::record([("celsius", reading.into())]))
            .await?;
    }
    println!("listeners: {}", producer.listener_count(&temperature));

    endpoint.shutdown().await;
    producer.fire(&temperature, 22.0_f64).await?;
    println!(
        "listeners after endpoint shutdown: {}",
        producer.listener_count(&temperature)
    );

    Ok(())
}
