//! The `client` module is the SDK for talking to a topicq broker.
//!
//! `Producer` and `Subscriber` each run the client half of the handshake
//! (role, then topic) and then the per-message acknowledgment protocol, so
//! callers never deal with frames or tokens directly.

pub mod producer;
mod session;
pub mod subscriber;

pub use producer::Producer;
pub use subscriber::Subscriber;

#[cfg(test)]
mod tests;
