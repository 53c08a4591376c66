//! Wire format for remote notifications.
//!
//! Frame format: `[length:4][body:N]`
//!
//! - **length**: body size in bytes (big-endian u32), at most the configured
//!   `max_frame_size`
//! - **body**: JSON encoding of [`Frame`]
//!
//! Exchange: the adapter sends `Notify`, the endpoint answers `Ack` or
//! `Nack`. One request in flight per connection.

use std::io;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::messages::Envelope;

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Frame {
    /// Deliver `envelope` to the exported listener.
    Notify { envelope: Envelope },
    /// The listener accepted the envelope.
    Ack,
    /// The listener failed; the adapter reports a delivery failure.
    Nack { reason: String },
}

/// Wire format error types.
#[derive(Debug, thiserror::Error)]
pub(crate) enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Frame body exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Writes one frame and flushes.
pub(crate) async fn write_frame<W>(w: &mut W, frame: &Frame, max: usize) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(frame)?;
    let len = u32::try_from(body.len())
        .ok()
        .filter(|_| body.len() <= max)
        .ok_or(WireError::FrameTooLarge {
            size: body.len(),
            max,
        })?;

    w.write_u32(len).await?;
    w.write_all(&body).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one frame; `Ok(None)` when the peer closed cleanly before a new frame.
pub(crate) async fn read_frame<R>(r: &mut R, max: usize) -> Result<Option<Frame>, WireError>
where
    R: AsyncRead + Unpin,
{
    let len = match r.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if len > max {
        return Err(WireError::FrameTooLarge { size: len, max });
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Payload, ProducerId};
    use crate::topics::Topic;
    use crate::remote::MAX_FRAME_SIZE;

    fn notify() -> Frame {
        let env = Envelope::builder(Topic::new("wire-tests", "t").unwrap(), ProducerId::new("p"))
            .with_payload(Payload::record([("x", 1.into())]))
            .build();
        Frame::Notify { envelope: env }
    }

    #[tokio::test]
    async fn test_frames_in_sequence() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        write_frame(&mut a, &notify(), MAX_FRAME_SIZE).await.unwrap();
        write_frame(&mut a, &Frame::Nack { reason: "r".into() }, MAX_FRAME_SIZE)
            .await
            .unwrap();
        drop(a);

        assert_eq!(read_frame(&mut b, MAX_FRAME_SIZE).await.unwrap(), Some(notify()));
        assert_eq!(
            read_frame(&mut b, MAX_FRAME_SIZE).await.unwrap(),
            Some(Frame::Nack { reason: "r".into() })
        );
        assert_eq!(read_frame(&mut b, MAX_FRAME_SIZE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_frames_rejected_both_ways() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        assert!(matches!(
            write_frame(&mut a, &notify(), 8).await,
            Err(WireError::FrameTooLarge { max: 8, .. })
        ));

        write_frame(&mut a, &notify(), MAX_FRAME_SIZE).await.unwrap();
        assert!(matches!(
            read_frame(&mut b, 8).await,
            Err(WireError::FrameTooLarge { max: 8, .. })
        ));
    }

    #[tokio::test]
    async fn test_frame_carries_nan_and_pre_epoch_timestamp() {
        let before = std::time::SystemTime::UNIX_EPOCH - std::time::Duration::from_nanos(1);
        let env = Envelope::builder(Topic::new("wire-tests", "t").unwrap(), ProducerId::new("p"))
            .with_payload(Payload::List(vec![f64::NAN.into(), f64::INFINITY.into()]))
            .with_timestamp(before)
            .build();
        let (mut a, mut b) = tokio::io::duplex(4096);
        write_frame(&mut a, &Frame::Notify { envelope: env }, MAX_FRAME_SIZE)
            .await
            .unwrap();

        let Some(Frame::Notify { envelope }) = read_frame(&mut b, MAX_FRAME_SIZE).await.unwrap() else {
            panic!("expected notify");
        };
        assert_eq!(envelope.timestamp(), Some(before));
        let Some(Payload::List(values)) = envelope.payload() else {
            panic!("expected list payload");
        };
        assert!(values[0].as_f64().is_some_and(f64::is_nan));
        assert_eq!(values[1], Payload::Double(f64::INFINITY));
    }

    #[tokio::test]
    async fn test_garbage_body_is_codec_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(3).await.unwrap();
        a.write_all(b"xyz").await.unwrap();
        assert!(matches!(
            read_frame(&mut b, MAX_FRAME_SIZE).await,
            Err(WireError::Codec(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(10).await.unwrap();
        a.write_all(b"{}").await.unwrap();
        drop(a);
        assert!(matches!(
            read_frame(&mut b, MAX_FRAME_SIZE).await,
            Err(WireError::Io(_))
        ));
    }
}
