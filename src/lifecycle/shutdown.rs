//! In-process shutdown trigger.

use tokio::sync::broadcast;

/// Broadcasts a stop request to running servers.
///
/// `HttpServer::run` listens on a receiver alongside OS signals, which lets
/// embedders and tests stop the proxy without sending a signal.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. A no-op when nothing is subscribed.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
