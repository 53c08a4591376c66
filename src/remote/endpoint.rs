use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RemoteError;
use crate::listeners::Listener;

use super::config::RemoteConfig;
use super::wire::{read_frame, write_frame, Frame, WireError};

/// Exposes a local listener to remote producers.
///
/// Every accepted connection is served by its own task: each `Notify` frame
/// is handed to the listener and answered with `Ack` or `Nack`. A body that
/// does not decode is answered with `Nack` and the connection stays open.
///
/// Dropping the endpoint stops accepting and closes open connections in the
/// background; [`shutdown`](Self::shutdown) does the same and waits for it.
pub struct RemoteEndpoint {
    local_addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RemoteEndpoint {
    /// Binds `cfg.host:cfg.port` and starts serving `listener`.
    pub async fn export(listener: Arc<dyn Listener>, cfg: &RemoteConfig) -> Result<Self, RemoteError> {
        let addr = cfg.bind_addr();
        let socket = TcpListener::bind(addr)
            .await
            .map_err(|source| RemoteError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| RemoteError::Bind { addr, source })?;

        info!(%local_addr, listener = listener.name(), "remote endpoint exported");

        let token = CancellationToken::new();
        let task = tokio::spawn(accept_loop(
            socket,
            listener,
            token.clone(),
            cfg.max_frame_size,
        ));
        Ok(Self {
            local_addr,
            token,
            task,
        })
    }

    /// Address the endpoint is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting, closes every open connection and waits until done.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Err(err) = (&mut self.task).await {
            warn!(local_addr = %self.local_addr, error = %err, "remote endpoint task failed");
        }
        info!(local_addr = %self.local_addr, "remote endpoint stopped");
    }
}

impl Drop for RemoteEndpoint {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn accept_loop(
    socket: TcpListener,
    listener: Arc<dyn Listener>,
    token: CancellationToken,
    max_frame: usize,
) {
    let mut conns = JoinSet::new();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            Some(_) = conns.join_next(), if !conns.is_empty() => {}
            accepted = socket.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "remote connection accepted");
                    conns.spawn(serve(stream, peer, listener.clone(), token.child_token(), max_frame));
                }
                Err(err) => warn!(error = %err, "accept failed"),
            },
        }
    }

    drop(socket);
    while conns.join_next().await.is_some() {}
}

async fn serve(
    mut stream: TcpStream,
    peer: SocketAddr,
    listener: Arc<dyn Listener>,
    token: CancellationToken,
    max_frame: usize,
) {
    loop {
        let frame = tokio::select! {
            _ = token.cancelled() => break,
            frame = read_frame(&mut stream, max_frame) => frame,
        };
        let reply = match frame {
            Ok(Some(frame)) => tokio::select! {
                _ = token.cancelled() => break,
                reply = answer(listener.as_ref(), peer, frame) => reply,
            },
            Ok(None) => break,
            // the whole body was consumed, so the stream is still framed
            Err(WireError::Codec(err)) => {
                warn!(%peer, error = %err, "undecodable frame from remote producer");
                Frame::Nack {
                    reason: format!("undecodable frame: {err}"),
                }
            }
            Err(err) => {
                warn!(%peer, error = %err, "remote read failed");
                break;
            }
        };
        if let Err(err) = write_frame(&mut stream, &reply, max_frame).await {
            warn!(%peer, error = %err, "remote write failed");
            break;
        }
    }
    debug!(%peer, "remote connection closed");
}

async fn answer(listener: &dyn Listener, peer: SocketAddr, frame: Frame) -> Frame {
    let envelope = match frame {
        Frame::Notify { envelope } => envelope,
        other => {
            warn!(%peer, frame = ?other, "unexpected frame from remote producer");
            return Frame::Nack {
                reason: "unexpected frame".to_string(),
            };
        }
    };

    match AssertUnwindSafe(listener.notify(&envelope)).catch_unwind().await {
        Ok(Ok(())) => Frame::Ack,
        Ok(Err(err)) => {
            debug!(%peer, topic = %envelope.topic(), reason = %err, "exported listener failed");
            Frame::Nack {
                reason: err.to_string(),
            }
        }
        Err(_) => {
            warn!(%peer, topic = %envelope.topic(), listener = listener.name(), "exported listener panicked");
            Frame::Nack {
                reason: "listener panicked".to_string(),
            }
        }
    }
}
