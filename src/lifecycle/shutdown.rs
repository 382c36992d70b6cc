//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::net::ConnectionTracker;

/// Coordinator for graceful shutdown.
///
/// Every long-running task subscribes; one trigger stops them all.
#[derive(Debug, Clone)]
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

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still listening for the signal.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wait for tracked connections to finish, up to `limit`.
    pub async fn drain(&self, tracker: &ConnectionTracker, limit: Duration) -> bool {
        let remaining = tracker.active_count();
        if remaining > 0 {
            tracing::info!(remaining, "Draining connections");
        }
        let drained = tracker.wait_idle(limit).await;
        if !drained {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain deadline reached, dropping remaining connections"
            );
        }
        drained
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);
        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn drain_waits_for_guards() {
        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });
        assert!(shutdown.drain(&tracker, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn drain_gives_up_at_deadline() {
        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let _guard = tracker.track();
        assert!(!shutdown.drain(&tracker, Duration::from_millis(20)).await);
    }
}
