//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use chathub_core::config::RealtimeConfig;

use crate::connection::events::ConnectionEvent;
use crate::connection::manager::ConnectionManager;
use crate::metrics::RealtimeMetrics;
use crate::presence::reaper::run_reaper;
use crate::presence::registry::PresenceRegistry;

/// Central real-time engine: the presence registry, the connection
/// manager and its event loop, and the reaper.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Presence registry.
    pub registry: Arc<PresenceRegistry>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("online", &self.registry.len())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and spawns its event loop and reaper.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_size);

        let metrics = Arc::new(RealtimeMetrics::new());
        let registry = Arc::new(PresenceRegistry::new());
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            registry.clone(),
            metrics.clone(),
            events_tx.clone(),
        ));

        let manager = connections.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { manager.run(events_rx, shutdown).await });

        tokio::spawn(run_reaper(
            registry.clone(),
            events_tx,
            config.reaper_interval(),
            config.ping_timeout(),
            shutdown_tx.subscribe(),
        ));

        info!(
            ping_interval_secs = config.ping_interval_seconds,
            ping_timeout_secs = config.ping_timeout_seconds,
            "Real-time engine started"
        );

        Self {
            connections,
            registry,
            metrics,
            shutdown_tx,
        }
    }

    /// Sender for lifecycle events, for components that detect lost
    /// connections outside the engine.
    pub fn events(&self) -> mpsc::Sender<ConnectionEvent> {
        self.connections.events()
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Stops the event loop and reaper and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
        info!("Real-time engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chathub_core::types::id::UserId;

    use super::*;
    use crate::message::OutboundMessage;

    async fn next_online(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<UserId> {
        loop {
            match rx.recv().await {
                Some(OutboundMessage::OnlineUsers { user_ids }) => return user_ids,
                Some(_) => continue,
                None => panic!("connection closed"),
            }
        }
    }

    #[tokio::test]
    async fn test_engine_processes_lifecycle() {
        let engine = RealtimeEngine::start(RealtimeConfig::default());
        let (u, v) = (UserId::new(), UserId::new());

        let (_hu, mut rx_u) = engine.connections.open(u).await.expect("open u");
        assert_eq!(next_online(&mut rx_u).await, vec![u]);

        let (hv, _rx_v) = engine.connections.open(v).await.expect("open v");
        assert_eq!(next_online(&mut rx_u).await.len(), 2);

        engine.connections.close(&hv).await;
        assert_eq!(next_online(&mut rx_u).await, vec![u]);

        engine.shutdown();
        assert!(engine.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_is_reaped() {
        let config = RealtimeConfig {
            ping_interval_seconds: 5,
            ping_timeout_seconds: 12,
            reaper_interval_seconds: 3,
            ..RealtimeConfig::default()
        };
        let engine = RealtimeEngine::start(config);
        let (u, v) = (UserId::new(), UserId::new());

        let (_hu, mut rx_u) = engine.connections.open(u).await.expect("open u");
        let (hv, mut rx_v) = engine.connections.open(v).await.expect("open v");
        assert_eq!(next_online(&mut rx_v).await.len(), 2);

        // v keeps answering, u stays silent.
        let keepalive = tokio::spawn(async move {
            loop {
                hv.touch().await;
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        });

        assert_eq!(next_online(&mut rx_v).await, vec![v]);
        assert!(!engine.registry.is_online(u));
        assert_eq!(engine.metrics.snapshot().connections_reaped, 1);

        // The reaped connection's writer is released so its transport closes.
        tokio::time::timeout(Duration::from_secs(30), async {
            while rx_u.recv().await.is_some() {}
        })
        .await
        .expect("writer closed after reap");
        keepalive.abort();
    }
}
