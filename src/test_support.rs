//! Helpers for tests that need a live broker.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::broker::TopicRegistry;
use crate::config::Settings;
use crate::transport::serve;
use crate::utils::error::Result;

pub(crate) struct TestBroker {
    pub addr: SocketAddr,
    pub registry: Arc<TopicRegistry>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestBroker {
    /// Starts a broker on an ephemeral loopback port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let registry = Arc::new(TopicRegistry::new());
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve(
            listener,
            Arc::clone(&registry),
            Settings::default(),
            async move {
                let _ = rx.await;
            },
        ));

        Self {
            addr,
            registry,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    /// Stops the accept loop and waits for it to return.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.handle).await.expect("server task panicked")
    }
}
