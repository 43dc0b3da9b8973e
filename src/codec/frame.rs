//! Length-prefixed frame encoding and decoding.
//!
//! `FrameCodec` owns the per-connection leftover buffer. Bytes read from the
//! stream are appended to it and frames are split off the front once they are
//! complete, so a frame may arrive in any number of reads and one read may
//! carry several frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::utils::error::{BrokerError, Result};

/// Size of the length header in front of every payload.
pub const HEADER_LEN: usize = 4;

/// Minimum spare capacity reserved before each read from the stream.
pub const READ_CHUNK: usize = 4096;

/// Largest payload accepted when no explicit limit is configured.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Result of waiting for the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete payload. May be empty.
    Frame(Bytes),
    /// The peer closed the stream cleanly on a frame boundary.
    Closed,
}

#[derive(Debug)]
pub struct FrameCodec {
    buf: BytesMut,
    max_frame_bytes: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK),
            max_frame_bytes,
        }
    }

    /// Bytes received but not yet returned as part of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Appends raw bytes to the leftover buffer.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Splits one complete frame off the buffer, if there is one.
    ///
    /// Returns `Ok(None)` while the header or payload is still incomplete.
    /// The header is validated against the size limit as soon as it is
    /// available, before the payload has arrived. Nothing is reserved for
    /// the announced payload; the buffer grows only as bytes are read.
    pub fn try_decode(&mut self) -> Result<Option<Bytes>> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let length = (&self.buf[..HEADER_LEN]).get_u32() as usize;
        if length > self.max_frame_bytes {
            return Err(BrokerError::FrameTooLarge {
                length,
                max: self.max_frame_bytes,
            });
        }

        let needed = HEADER_LEN + length;
        if self.buf.len() < needed {
            return Ok(None);
        }

        self.buf.advance(HEADER_LEN);
        Ok(Some(self.buf.split_to(length).freeze()))
    }

    /// Reads from `reader` until a full frame is buffered and returns it.
    ///
    /// A zero-length read with an empty buffer yields [`Decoded::Closed`]. A
    /// zero-length read in the middle of a frame is an `UnexpectedEof` error.
    /// Cancelling the returned future loses no bytes: anything read so far
    /// stays in the buffer.
    pub async fn decode<R>(&mut self, reader: &mut R) -> Result<Decoded>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(frame) = self.try_decode()? {
                tracing::trace!(len = frame.len(), leftover = self.buf.len(), "decoded frame");
                return Ok(Decoded::Frame(frame));
            }

            self.buf.reserve(READ_CHUNK);
            let read = reader.read_buf(&mut self.buf).await?;
            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(Decoded::Closed);
                }
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "stream closed with {} bytes of an incomplete frame buffered",
                        self.buf.len()
                    ),
                )
                .into());
            }
        }
    }
}

/// Encodes `payload` as a single frame: header and payload in one buffer.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let length =
        u32::try_from(payload.len()).map_err(|_| BrokerError::PayloadTooLarge(payload.len()))?;
    let mut out = BytesMut::with_capacity(HEADER_LEN + payload.len());
    out.put_u32(length);
    out.put_slice(payload);
    Ok(out.freeze())
}

/// Writes one frame and flushes it. Short writes are retried by `write_all`.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    tracing::trace!(len = payload.len(), "wrote frame");
    Ok(())
}
