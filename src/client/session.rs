//! Client side of the handshake, shared by `Producer` and `Subscriber`.

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::codec::{Decoded, FramedStream};
use crate::transport::message::{OK, Role};
use crate::utils::error::{BrokerError, Result};

pub(crate) type Connection = FramedStream<TcpStream>;

/// Connects to `addr` and completes the role and topic steps.
///
/// On any failure the stream is dropped, so the caller is left disconnected.
pub(crate) async fn open(addr: &str, role: Role, topic: &str) -> Result<Connection> {
    let stream = TcpStream::connect(addr).await?;
    if let Err(e) = stream.set_nodelay(true) {
        warn!("could not set TCP_NODELAY: {e}");
    }
    debug!(addr, "connected to broker");

    let mut conn = FramedStream::new(stream);
    conn.send(role.token()).await?;
    expect_ok(&mut conn, "role").await?;
    debug!(%role, "role accepted");

    conn.send(topic.as_bytes()).await?;
    expect_ok(&mut conn, "topic").await?;
    debug!(%role, topic, "joined topic");

    Ok(conn)
}

/// Shuts a connection down if there is one. Errors are only logged: the
/// connection is released either way.
pub(crate) async fn close(conn: &mut Option<Connection>) {
    if let Some(mut conn) = conn.take() {
        if let Err(e) = conn.shutdown().await {
            debug!("shutdown failed while closing: {e}");
        }
        debug!("connection closed");
    }
}

async fn expect_ok(conn: &mut Connection, step: &'static str) -> Result<()> {
    match conn.recv().await? {
        Decoded::Frame(reply) if reply.as_ref() == OK => Ok(()),
        Decoded::Frame(reply) => Err(BrokerError::HandshakeRejected {
            step,
            reply: String::from_utf8_lossy(&reply).into_owned(),
        }),
        Decoded::Closed => Err(BrokerError::ConnectionClosed),
    }
}
