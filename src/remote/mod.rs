//! Remote delivery over TCP.
//!
//! Two halves:
//! - [`RemoteEndpoint`]: exports a local listener on a socket;
//! - [`RemoteListener`]: a [`Listener`](crate::Listener) that forwards
//!   envelopes to an endpoint and waits for the verdict.
//!
//! ```text
//!  producer ──fire──► RemoteListener ──Notify──► RemoteEndpoint ──notify──► listener
//!                          ▲                          │
//!                          └──────── Ack / Nack ──────┘
//! ```
//!
//! Remote failures look like local ones to the producer: the adapter returns
//! an error and gets unsubscribed.

mod adapter;
mod config;
mod endpoint;
mod wire;

pub use adapter::RemoteListener;
pub use config::{
    RemoteConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT,
    MAX_FRAME_SIZE,
};
pub use endpoint::RemoteEndpoint;
