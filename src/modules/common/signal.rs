use std::sync::LazyLock;

use crate::modules::{
    context::Initialize, error::RustCampaignResult, utils::shutdown::shutdown_signal,
};
use tokio::sync::broadcast;
use tracing::info;

pub static SIGNAL_MANAGER: LazyLock<SignalManager> = LazyLock::new(SignalManager::new);

/// Fans the process shutdown signal out to the HTTP server and background tasks.
pub struct SignalManager {
    sender: broadcast::Sender<()>,
}

impl SignalManager {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        SignalManager { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Resolves once shutdown has been signalled.
    pub async fn wait(&self) {
        let mut receiver = self.subscribe();
        let _ = receiver.recv().await;
    }

    pub fn trigger(&self) {
        let _ = self.sender.send(());
    }
}

impl Initialize for SignalManager {
    async fn initialize() -> RustCampaignResult<()> {
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown requested, notifying subscribers");
            SIGNAL_MANAGER.trigger();
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SignalManager;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_waiters() {
        let manager = std::sync::Arc::new(SignalManager::new());
        let waiter = tokio::spawn({
            let manager = manager.clone();
            async move { manager.wait().await }
        });
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
