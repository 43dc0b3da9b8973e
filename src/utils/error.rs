//! The `error` module defines the error type shared by the broker, the
//! transport layer and the client SDK.
//!
//! Every fallible operation in `topicq` returns `Result<T, BrokerError>` so
//! that callers can propagate failures with `?`.

use thiserror::Error;

/// Errors raised while framing, serving or consuming a connection.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame header announced a payload larger than the configured maximum.
    #[error("frame length {length} exceeds maximum {max}")]
    FrameTooLarge { length: usize, max: usize },

    /// A payload is too long to be described by the length header.
    #[error("payload of {0} bytes cannot be encoded in a single frame")]
    PayloadTooLarge(usize),

    /// The broker answered a handshake step with something other than `ok`.
    #[error("handshake rejected during {step}: {reply}")]
    HandshakeRejected { step: &'static str, reply: String },

    /// The peer closed the connection before the exchange completed.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The operation needs an open connection and there is none.
    #[error("not connected")]
    NotConnected,

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
