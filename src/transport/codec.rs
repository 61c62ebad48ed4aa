//! Frame Codec
//!
//! Byte-stream framing for `Frame`: a big-endian `u32` length followed by the
//! bincode-encoded body.

use super::types::Frame;

use anyhow::{Context, Result, bail};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on an encoded frame body.
pub const MAX_FRAME_LEN: usize = 512 * 1024 * 1024;

pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = bincode::serialize(frame)?;
    if encoded.len() > MAX_FRAME_LEN {
        bail!(
            "{} frame of {} bytes exceeds the {} byte limit",
            frame.kind(),
            encoded.len(),
            MAX_FRAME_LEN
        );
    }

    writer.write_u32(encoded.len() as u32).await?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;

    Ok(())
}

/// Reads one frame. `Ok(None)` means the stream ended cleanly between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_LEN {
        bail!("Incoming frame of {} bytes exceeds the {} byte limit", len, MAX_FRAME_LEN);
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .context("Stream ended inside a frame")?;

    let frame = bincode::deserialize(&body).context("Failed to decode frame")?;
    Ok(Some(frame))
}
