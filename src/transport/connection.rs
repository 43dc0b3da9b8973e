//! Per-connection handler
//!
//! Each accepted connection is driven through a small state machine:
//!
//! ```text
//! AwaitRole -> AwaitTopic -> Publishing  -> Closed
//!                         \-> Subscribing -> Closed
//! ```
//!
//! - `AwaitRole`: the first frame must be `pub` or `sub`; anything else is
//!   answered with `failed` and the connection is closed.
//! - `AwaitTopic`: the next frame is a UTF-8 topic name, resolved through the
//!   shared `TopicRegistry` and answered with `ok`.
//! - `Publishing`: every frame is a message; it is enqueued and answered
//!   with `ok`.
//! - `Subscribing`: after a `prepared` frame, messages are dequeued and sent
//!   one at a time. The next message is only dequeued once the peer has
//!   answered the previous one with `ok`.
//!
//! Any I/O error is handled exactly like the peer closing the stream: the
//! handler moves to `Closed`, shuts the stream down and returns. A message
//! that was dequeued but never acknowledged is not put back.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::{Topic, TopicRegistry};
use crate::codec::{Decoded, FrameCodec, FramedStream};
use crate::transport::message::{FAILED, OK, PREPARED, Role};
use crate::utils::error::BrokerError;

/// Where a connection is in its lifecycle.
#[derive(Debug)]
pub enum State {
    AwaitRole,
    AwaitTopic(Role),
    Publishing(Arc<Topic>),
    Subscribing(Arc<Topic>),
    Closed(CloseReason),
}

/// Why a connection ended up in `Closed`.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed the stream.
    PeerClosed,
    /// The first frame was not a known role token.
    InvalidRole,
    /// The topic name was not valid UTF-8.
    InvalidTopic,
    /// A subscriber sent something other than `prepared`.
    NotPrepared,
    /// A subscriber answered a delivery with something other than `ok`.
    AckRejected,
    /// A subscriber sent a frame while no delivery was outstanding.
    UnexpectedFrame,
    /// The stream failed.
    Error(BrokerError),
}

pub struct ConnectionHandler<S> {
    id: Uuid,
    conn: FramedStream<S>,
    registry: Arc<TopicRegistry>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, registry: Arc<TopicRegistry>, max_frame_bytes: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            conn: FramedStream::with_codec(stream, FrameCodec::new(max_frame_bytes)),
            registry,
        }
    }

    /// Correlation id used in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drives the connection until it is closed and reports why.
    pub async fn run(mut self) -> CloseReason {
        let mut state = State::AwaitRole;
        let reason = loop {
            state = match state {
                State::AwaitRole => self.await_role().await,
                State::AwaitTopic(role) => self.await_topic(role).await,
                State::Publishing(topic) => self.publish(topic).await,
                State::Subscribing(topic) => self.subscribe(topic).await,
                State::Closed(reason) => break reason,
            };
        };

        if let Err(e) = self.conn.shutdown().await {
            debug!("shutdown after close failed: {e}");
        }
        match &reason {
            CloseReason::PeerClosed => info!("connection closed by peer"),
            CloseReason::Error(e) => warn!("connection closed after error: {e}"),
            other => info!(reason = ?other, "connection closed"),
        }
        reason
    }

    async fn await_role(&mut self) -> State {
        let token = match self.recv().await {
            Ok(token) => token,
            Err(reason) => {
                self.reply_failed().await;
                return State::Closed(reason);
            }
        };

        let Some(role) = Role::from_token(&token) else {
            warn!(token = %String::from_utf8_lossy(&token), "rejected unknown role");
            self.reply_failed().await;
            return State::Closed(CloseReason::InvalidRole);
        };

        tracing::Span::current().record("role", role.as_str());
        match self.send(OK).await {
            Ok(()) => State::AwaitTopic(role),
            Err(reason) => State::Closed(reason),
        }
    }

    async fn await_topic(&mut self, role: Role) -> State {
        let raw = match self.recv().await {
            Ok(raw) => raw,
            Err(CloseReason::PeerClosed) => return State::Closed(CloseReason::PeerClosed),
            Err(reason) => {
                self.reply_failed().await;
                return State::Closed(reason);
            }
        };

        let Ok(name) = std::str::from_utf8(&raw) else {
            warn!("rejected topic name that is not UTF-8");
            self.reply_failed().await;
            return State::Closed(CloseReason::InvalidTopic);
        };

        let topic = self.registry.resolve(name);
        tracing::Span::current().record("topic", name);
        if let Err(reason) = self.send(OK).await {
            return State::Closed(reason);
        }

        debug!(%role, topic = name, "handshake complete");
        match role {
            Role::Producer => State::Publishing(topic),
            Role::Consumer => State::Subscribing(topic),
        }
    }

    async fn publish(&mut self, topic: Arc<Topic>) -> State {
        loop {
            let message = match self.recv().await {
                Ok(message) => message,
                Err(reason) => return State::Closed(reason),
            };

            debug!(len = message.len(), "message from producer");
            topic.queue().enqueue(message);

            if let Err(reason) = self.send(OK).await {
                return State::Closed(reason);
            }
        }
    }

    async fn subscribe(&mut self, topic: Arc<Topic>) -> State {
        match self.recv().await {
            Ok(token) if token.as_ref() == PREPARED => {}
            Ok(token) => {
                warn!(token = %String::from_utf8_lossy(&token), "subscriber not prepared");
                return State::Closed(CloseReason::NotPrepared);
            }
            Err(reason) => return State::Closed(reason),
        }
        debug!("subscriber prepared");

        loop {
            // Watch the peer while waiting so an idle disconnect is noticed
            // before a message is taken off the queue.
            let message = tokio::select! {
                message = topic.queue().dequeue() => message,
                idle = self.conn.recv() => {
                    return State::Closed(match idle {
                        Ok(Decoded::Closed) => CloseReason::PeerClosed,
                        Ok(Decoded::Frame(_)) => CloseReason::UnexpectedFrame,
                        Err(e) => CloseReason::Error(e),
                    });
                }
            };

            debug!(len = message.len(), "delivering message");
            if let Err(reason) = self.send(&message).await {
                warn!(len = message.len(), "message lost, delivery failed");
                return State::Closed(reason);
            }

            match self.recv().await {
                Ok(ack) if ack.as_ref() == OK => {}
                Ok(ack) => {
                    warn!(ack = %String::from_utf8_lossy(&ack), "delivery not acknowledged");
                    return State::Closed(CloseReason::AckRejected);
                }
                Err(reason) => {
                    warn!(len = message.len(), "message lost, subscriber gone before ack");
                    return State::Closed(reason);
                }
            }
        }
    }

    async fn recv(&mut self) -> Result<Bytes, CloseReason> {
        match self.conn.recv().await {
            Ok(Decoded::Frame(frame)) => Ok(frame),
            Ok(Decoded::Closed) => Err(CloseReason::PeerClosed),
            Err(e) => Err(CloseReason::Error(e)),
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), CloseReason> {
        self.conn.send(payload).await.map_err(CloseReason::Error)
    }

    async fn reply_failed(&mut self) {
        if let Err(e) = self.conn.send(FAILED).await {
            debug!("could not send failure reply: {e}");
        }
    }
}
