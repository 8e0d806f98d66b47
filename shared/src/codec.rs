//! Length-prefixed bincode framing for [`Packet`]s over a byte stream.
//!
//! Each frame is a big-endian `u32` payload length followed by the bincode
//! encoding of exactly one packet.

use crate::Packet;
use bincode::{deserialize, serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted from the wire.
pub const MAX_FRAME_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed packet: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {0} bytes exceeds the frame size limit")]
    TooLarge(usize),
}

/// Serializes a packet into a complete frame, length prefix included.
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, FrameError> {
    let payload = serialize(packet)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_packet(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next packet from the stream.
///
/// Returns `Ok(None)` when the stream ends before a length prefix could be
/// read. A stream that ends inside a payload is an error.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(deserialize(&payload)?))
}
