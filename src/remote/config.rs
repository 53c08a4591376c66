//! Configuration for the remote endpoint and the remote listener adapter.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default interface for exported endpoints (loopback).
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default port: `0` lets the OS pick a free one; read it back with
/// [`RemoteEndpoint::local_addr`](crate::RemoteEndpoint::local_addr).
pub const DEFAULT_PORT: u16 = 0;

/// Default bound on establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on one notify round-trip (`0` = unbounded).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::ZERO;

/// Largest frame body accepted or sent (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Transport settings shared by [`RemoteEndpoint`](crate::RemoteEndpoint) and
/// [`RemoteListener`](crate::RemoteListener).
///
/// Zero durations disable the corresponding timeout.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Interface the endpoint binds to.
    pub host: IpAddr,
    /// Port the endpoint binds to (`0` = OS-assigned).
    pub port: u16,
    /// Timeout for connection attempts.
    pub connect_timeout: Duration,
    /// Timeout for one notify round-trip (send + ack).
    pub request_timeout: Duration,
    /// Largest frame body, in bytes.
    pub max_frame_size: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl RemoteConfig {
    /// Configuration binding `host:port`, other settings default.
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    /// Preset for loopback use: short timeouts on both connect and request.
    pub fn local() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_secs(2),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the largest frame body (minimum 1 byte).
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size.max(1);
        self
    }

    /// Address the endpoint binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[inline]
    pub fn connect_timeout_limit(&self) -> Option<Duration> {
        non_zero(self.connect_timeout)
    }

    #[inline]
    pub fn request_timeout_limit(&self) -> Option<Duration> {
        non_zero(self.request_timeout)
    }
}

fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO {
        None
    } else {
        Some(d)
    }
}
