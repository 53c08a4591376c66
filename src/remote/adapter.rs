use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tracing::debug;

use crate::error::{ListenerError, RemoteError};
use crate::listeners::Listener;
use crate::messages::Envelope;

use super::config::RemoteConfig;
use super::wire::{read_frame, write_frame, Frame};

/// Local stand-in for a listener exported by a [`RemoteEndpoint`](crate::RemoteEndpoint).
///
/// Subscribe it like any other listener. Each `notify` forwards the envelope
/// and waits for the remote answer; a `Nack`, a broken connection or an
/// expired request timeout is reported as a delivery failure, so the producer
/// drops the adapter exactly as it would drop a failing local listener.
///
/// A connection that broke mid-request is discarded and reopened on the next
/// `notify`.
pub struct RemoteListener {
    addr: SocketAddr,
    cfg: RemoteConfig,
    conn: Mutex<Option<TcpStream>>,
}

impl RemoteListener {
    /// Connects to the endpoint at `addr`.
    pub async fn connect(addr: SocketAddr, cfg: &RemoteConfig) -> Result<Self, RemoteError> {
        let stream = open(addr, cfg).await?;
        debug!(%addr, "remote listener connected");
        Ok(Self {
            addr,
            cfg: cfg.clone(),
            conn: Mutex::new(Some(stream)),
        })
    }

    /// Address of the remote endpoint.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn exchange(&self, stream: &mut TcpStream, envelope: &Envelope) -> Result<(), ListenerError> {
        let max = self.cfg.max_frame_size;
        let request = Frame::Notify {
            envelope: envelope.clone(),
        };
        write_frame(stream, &request, max).await.map_err(transport)?;

        match read_frame(stream, max).await.map_err(transport)? {
            Some(Frame::Ack) => Ok(()),
            Some(Frame::Nack { reason }) => Err(ListenerError::Rejected { reason }),
            Some(Frame::Notify { .. }) => Err(ListenerError::Transport {
                reason: "unexpected notify frame from endpoint".to_string(),
            }),
            None => Err(ListenerError::Transport {
                reason: format!("connection to {} closed", self.addr),
            }),
        }
    }
}

#[async_trait]
impl Listener for RemoteListener {
    async fn notify(&self, envelope: &Envelope) -> Result<(), ListenerError> {
        let mut slot = self.conn.lock().await;
        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => open(self.addr, &self.cfg).await.map_err(transport)?,
        };

        let outcome = match self.cfg.request_timeout_limit() {
            Some(limit) => time::timeout(limit, self.exchange(&mut stream, envelope))
                .await
                .unwrap_or(Err(ListenerError::Timeout { timeout: limit })),
            None => self.exchange(&mut stream, envelope).await,
        };

        // Only a completed exchange leaves the stream in a known state.
        if matches!(outcome, Ok(()) | Err(ListenerError::Rejected { .. })) {
            *slot = Some(stream);
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

async fn open(addr: SocketAddr, cfg: &RemoteConfig) -> Result<TcpStream, RemoteError> {
    let connect = TcpStream::connect(addr);
    let stream = match cfg.connect_timeout_limit() {
        Some(limit) => time::timeout(limit, connect)
            .await
            .map_err(|_| RemoteError::ConnectTimeout {
                addr,
                timeout: limit,
            })?,
        None => connect.await,
    }
    .map_err(|source| RemoteError::Connect { addr, source })?;

    if let Err(err) = stream.set_nodelay(true) {
        debug!(%addr, error = %err, "cannot set TCP_NODELAY");
    }
    Ok(stream)
}

fn transport(err: impl std::fmt::Display) -> ListenerError {
    ListenerError::Transport {
        reason: err.to_string(),
    }
}
