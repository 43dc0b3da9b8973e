//! # topicq
//!
//! `topicq` is a minimal TCP message broker. Connections declare themselves
//! producers or consumers of a named topic, and the broker relays opaque byte
//! payloads between them through one in-memory FIFO queue per topic.
//!
//! Consumers of the same topic compete for messages: each message is
//! delivered to exactly one of them, one at a time, and the next message is
//! only sent once the previous one has been acknowledged.
//!
//! ## Core Modules
//!
//! - `broker`: the topic registry and the per-topic message queues.
//! - `client`: `Producer` and `Subscriber`, the client SDK.
//! - `codec`: length-prefixed framing over any async byte stream.
//! - `config`: loading settings from file and environment.
//! - `transport`: the TCP listener and the per-connection state machine.
//! - `utils`: error type and logging setup.

pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod test_support;
