//! The `codec` module implements the wire framing shared by the broker and
//! the client SDK.
//!
//! Every unit on the wire is a frame: a 4-byte big-endian payload length
//! followed by that many payload bytes. Control tokens, topic names and
//! messages all travel as frame payloads.

pub mod frame;
pub mod stream;

pub use frame::{
    DEFAULT_MAX_FRAME_BYTES, Decoded, FrameCodec, HEADER_LEN, READ_CHUNK, encode, write_frame,
};
pub use stream::FramedStream;
