//! The `transport` module is responsible for the network side of the broker.
//!
//! It defines the control tokens of the wire protocol, the per-connection
//! handler that runs the handshake and the publish/subscribe loops, and the
//! TCP listener that spawns one handler per accepted connection.

pub mod connection;
pub mod message;
pub mod tcp;

pub use connection::{CloseReason, ConnectionHandler, State};
pub use message::Role;
pub use tcp::{serve, start_tcp_server};
