use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::codec::frame::{Decoded, FrameCodec, write_frame};
use crate::utils::error::Result;

/// A byte stream paired with the framing state that belongs to it.
///
/// Both the broker's connection handler and the client SDK talk through this
/// type so they share one implementation of the wire format.
#[derive(Debug)]
pub struct FramedStream<S> {
    stream: S,
    codec: FrameCodec,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self::with_codec(stream, FrameCodec::default())
    }

    pub fn with_codec(stream: S, codec: FrameCodec) -> Self {
        Self { stream, codec }
    }

    /// Waits for the next frame from the peer.
    pub async fn recv(&mut self) -> Result<Decoded> {
        self.codec.decode(&mut self.stream).await
    }

    /// Sends one frame to the peer.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        write_frame(&mut self.stream, payload).await
    }

    /// Shuts down the write half; the read half goes away on drop.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
