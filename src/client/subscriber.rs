use std::ops::ControlFlow;

use bytes::Bytes;
use tracing::debug;

use crate::client::session::{self, Connection};
use crate::codec::Decoded;
use crate::transport::message::{OK, PREPARED, Role};
use crate::utils::error::{BrokerError, Result};

/// Consumes messages from one topic.
///
/// The handler passed to [`Subscriber::consume`] runs on the task that reads
/// the socket, and the acknowledgment is only sent once it returns. The
/// broker does not send the next message before that acknowledgment, so a
/// slow handler slows delivery down.
#[derive(Debug)]
pub struct Subscriber {
    addr: String,
    topic: String,
    conn: Option<Connection>,
    prepared: bool,
}

impl Subscriber {
    /// Connects to the broker at `addr` and registers as a consumer of `topic`.
    pub async fn connect(addr: impl Into<String>, topic: impl Into<String>) -> Result<Self> {
        let mut subscriber = Self {
            addr: addr.into(),
            topic: topic.into(),
            conn: None,
            prepared: false,
        };
        subscriber.conn =
            Some(session::open(&subscriber.addr, Role::Consumer, &subscriber.topic).await?);
        Ok(subscriber)
    }

    /// Drops the current connection, if any, and handshakes again for `topic`.
    pub async fn reconnect(&mut self, topic: &str) -> Result<()> {
        self.close().await;
        self.topic = topic.to_string();
        self.conn = Some(session::open(&self.addr, Role::Consumer, &self.topic).await?);
        Ok(())
    }

    /// Hands every delivered message to `handler` until the broker closes the
    /// connection. Returns how many messages were handled.
    pub async fn consume<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(Bytes),
    {
        self.consume_until(|message| {
            handler(message);
            ControlFlow::Continue(())
        })
        .await
    }

    /// Like [`Subscriber::consume`] but stops as soon as `handler` returns
    /// `ControlFlow::Break`. The message that caused the break is still
    /// acknowledged, and a later call picks up where this one stopped.
    ///
    /// Once the broker has been told the subscriber is ready it may already
    /// have sent the next message; closing the subscriber after a break drops
    /// that message.
    pub async fn consume_until<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(Bytes) -> ControlFlow<()>,
    {
        let conn = self.conn.as_mut().ok_or(BrokerError::NotConnected)?;

        let result = pump(conn, &mut self.prepared, &mut handler).await;
        match &result {
            // the stream ended or failed; it cannot carry anything else
            Ok(Pumped::Closed(_)) | Err(_) => {
                self.conn = None;
                self.prepared = false;
            }
            Ok(Pumped::Stopped(_)) => {}
        }

        let handled = match result? {
            Pumped::Closed(n) | Pumped::Stopped(n) => n,
        };
        debug!(topic = %self.topic, handled, "consume returned");
        Ok(handled)
    }

    /// Shuts the connection down. Calling it again is a no-op.
    pub async fn close(&mut self) {
        session::close(&mut self.conn).await;
        self.prepared = false;
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

enum Pumped {
    Closed(usize),
    Stopped(usize),
}

async fn pump<F>(conn: &mut Connection, prepared: &mut bool, handler: &mut F) -> Result<Pumped>
where
    F: FnMut(Bytes) -> ControlFlow<()>,
{
    if !*prepared {
        conn.send(PREPARED).await?;
        *prepared = true;
    }

    let mut handled = 0;
    loop {
        let message = match conn.recv().await? {
            Decoded::Frame(message) => message,
            Decoded::Closed => return Ok(Pumped::Closed(handled)),
        };

        let flow = handler(message);
        handled += 1;
        conn.send(OK).await?;

        if flow.is_break() {
            return Ok(Pumped::Stopped(handled));
        }
    }
}
