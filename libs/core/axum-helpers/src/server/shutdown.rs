//! Shutdown signal handling and cleanup coordination.

use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

/// Completes when the process receives SIGTERM or Ctrl+C.
///
/// Pass to `axum::serve(...).with_graceful_shutdown` so in-flight requests
/// drain before the listener closes.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}

/// Broadcasts a single shutdown event to every subscribed task.
///
/// The server triggers it once the OS signal arrives; cleanup tasks
/// (closing the connection pool, flushing buffers) wait on it.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (tx, rx) = broadcast::channel(1);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify all subscribers. Safe to call when none exist.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Block until [`trigger`](Self::trigger) is called.
    pub async fn wait_for_signal(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.recv().await;
    }
}

/// Wait for the OS signal, then fan it out through the coordinator.
pub async fn coordinated_shutdown(coordinator: ShutdownCoordinator) {
    shutdown_signal().await;
    coordinator.trigger();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_waiting_subscriber() {
        let (coordinator, _rx) = ShutdownCoordinator::new();
        let waiter = coordinator.clone();

        let handle = tokio::spawn(async move {
            waiter.wait_for_signal().await;
            true
        });

        coordinator.trigger();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_trigger_without_subscribers_is_harmless() {
        let (coordinator, rx) = ShutdownCoordinator::new();
        drop(rx);
        coordinator.trigger();
    }
}
