//! TCP listener
//!
//! Accepts connections and spawns one `ConnectionHandler` task per
//! connection. There is no limit on the number of live handlers. Handlers
//! share nothing but the `TopicRegistry`, so a failing connection cannot
//! affect any other.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, field, info, info_span, warn};

use crate::broker::TopicRegistry;
use crate::config::Settings;
use crate::transport::connection::ConnectionHandler;
use crate::utils::error::Result;

/// Binds `addr` and serves connections until `shutdown` resolves.
pub async fn start_tcp_server<F>(
    addr: String,
    registry: Arc<TopicRegistry>,
    settings: Settings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, registry, settings, shutdown).await
}

/// Runs the accept loop on an already bound listener.
///
/// Returns `Ok(())` once `shutdown` resolves; handlers that are still
/// running keep going until their connections end. An accept error stops the
/// loop and is returned.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Arc<TopicRegistry>,
    settings: Settings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    info!("topicq broker listening on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                spawn_handler(stream, peer, Arc::clone(&registry), &settings);
            }
        }
    }
}

fn spawn_handler(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<TopicRegistry>,
    settings: &Settings,
) {
    // acks are tiny; don't let Nagle hold them back
    if let Err(e) = stream.set_nodelay(true) {
        warn!(%peer, "could not set TCP_NODELAY: {e}");
    }

    let handler = ConnectionHandler::new(stream, registry, settings.broker.max_frame_bytes);
    let span = info_span!(
        "conn",
        id = %handler.id(),
        %peer,
        role = field::Empty,
        topic = field::Empty
    );
    info!(parent: &span, "connection accepted");
    tokio::spawn(
        async move {
            handler.run().await;
        }
        .instrument(span),
    );
}
