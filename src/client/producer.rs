use tracing::debug;

use crate::client::session::{self, Connection};
use crate::codec::Decoded;
use crate::transport::message::{OK, Role};
use crate::utils::error::{BrokerError, Result};

/// Publishes messages to one topic.
///
/// Every `publish` waits for the broker's acknowledgment before returning,
/// so at most one message per producer is in flight.
#[derive(Debug)]
pub struct Producer {
    addr: String,
    topic: String,
    conn: Option<Connection>,
}

impl Producer {
    /// Connects to the broker at `addr` and registers as a producer of `topic`.
    pub async fn connect(addr: impl Into<String>, topic: impl Into<String>) -> Result<Self> {
        let mut producer = Self {
            addr: addr.into(),
            topic: topic.into(),
            conn: None,
        };
        producer.conn = Some(session::open(&producer.addr, Role::Producer, &producer.topic).await?);
        Ok(producer)
    }

    /// Drops the current connection, if any, and handshakes again for `topic`.
    pub async fn reconnect(&mut self, topic: &str) -> Result<()> {
        session::close(&mut self.conn).await;
        self.topic = topic.to_string();
        self.conn = Some(session::open(&self.addr, Role::Producer, &self.topic).await?);
        Ok(())
    }

    /// Sends one message and waits for the acknowledgment.
    ///
    /// Returns `Ok(true)` when the broker answered `ok` and `Ok(false)` for
    /// any other answer. Nothing is retried. A stream failure drops the
    /// connection and later calls return [`BrokerError::NotConnected`].
    pub async fn publish(&mut self, payload: impl AsRef<[u8]>) -> Result<bool> {
        let conn = self.conn.as_mut().ok_or(BrokerError::NotConnected)?;
        let payload = payload.as_ref();

        let result = exchange(conn, payload).await;
        if result.is_err() {
            self.conn = None;
        }
        let acked = result?;
        if !acked {
            debug!(topic = %self.topic, len = payload.len(), "publish not acknowledged");
        }
        Ok(acked)
    }

    /// Shuts the connection down. Calling it again is a no-op.
    pub async fn close(&mut self) {
        session::close(&mut self.conn).await;
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

async fn exchange(conn: &mut Connection, payload: &[u8]) -> Result<bool> {
    conn.send(payload).await?;
    match conn.recv().await? {
        Decoded::Frame(ack) => Ok(ack.as_ref() == OK),
        Decoded::Closed => Err(BrokerError::ConnectionClosed),
    }
}
