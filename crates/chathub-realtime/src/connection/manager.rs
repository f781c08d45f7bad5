//! Connection manager: connection lifecycle and inbound frame handling.
//!
//! Presence mutations happen only in [`ConnectionManager::apply`], driven by
//! a single event loop, so each connect or disconnect is followed by a
//! broadcast that reflects exactly that change and everything before it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use chathub_core::config::RealtimeConfig;
use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;

use crate::message::serializer::deserialize_inbound;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::message::validator::validate_inbound;
use crate::metrics::RealtimeMetrics;
use crate::presence::broadcaster::PresenceBroadcaster;
use crate::presence::registry::PresenceRegistry;

use super::events::ConnectionEvent;
use super::handle::ConnectionHandle;
use super::heartbeat::{HeartbeatConfig, run_heartbeat};

/// Manages all live connections.
#[derive(Debug)]
pub struct ConnectionManager {
    registry: Arc<PresenceRegistry>,
    broadcaster: PresenceBroadcaster,
    metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
    events: mpsc::Sender<ConnectionEvent>,
}

impl ConnectionManager {
    /// Creates a manager that publishes lifecycle events on `events`.
    pub fn new(
        config: RealtimeConfig,
        registry: Arc<PresenceRegistry>,
        metrics: Arc<RealtimeMetrics>,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            broadcaster: PresenceBroadcaster::new(registry.clone(), metrics.clone()),
            registry,
            metrics,
            config,
            events,
        }
    }

    /// Opens a connection for an authenticated identity.
    ///
    /// Returns the handle and the receiver the transport writer drains.
    /// The connection is registered once the event loop processes it.
    pub async fn open(
        &self,
        user_id: UserId,
    ) -> AppResult<(Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>)> {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, tx));

        self.events
            .send(ConnectionEvent::Opened(handle.clone()))
            .await
            .map_err(|_| AppError::service_unavailable("Realtime engine is not running"))?;

        tokio::spawn(run_heartbeat(
            handle.clone(),
            HeartbeatConfig::from(&self.config),
            self.events.clone(),
        ));
        self.metrics.connection_opened();

        info!(conn_id = %handle.id, user_id = %user_id, "Connection opened");
        Ok((handle, rx))
    }

    /// Reports that the transport behind `handle` closed.
    pub async fn close(&self, handle: &ConnectionHandle) {
        handle.mark_dead();
        if self.events.send(ConnectionEvent::closed(handle)).await.is_err() {
            debug!(conn_id = %handle.id, "Event loop gone, close not reported");
        }
        info!(conn_id = %handle.id, user_id = %handle.user_id, "Connection closed");
    }

    /// Applies one lifecycle event to the registry and broadcasts the
    /// result.
    ///
    /// Returns `true` if presence changed. Disconnects for connections that
    /// are no longer registered are swallowed.
    pub fn apply(&self, event: ConnectionEvent) -> bool {
        let (user_id, connection_id, reaped) = match event {
            ConnectionEvent::Opened(handle) => {
                let (user_id, conn_id) = (handle.user_id, handle.id);
                if let Some(previous) = self.registry.connect(handle) {
                    self.metrics.connection_superseded();
                    info!(
                        user_id = %user_id,
                        conn_id = %conn_id,
                        previous = %previous.handle.id,
                        "Connection superseded"
                    );
                }
                self.broadcaster.broadcast();
                return true;
            }
            ConnectionEvent::Closed {
                user_id,
                connection_id,
            } => (user_id, connection_id, false),
            ConnectionEvent::LivenessLost {
                user_id,
                connection_id,
            } => (user_id, connection_id, true),
        };

        match self.registry.disconnect(user_id, connection_id) {
            Ok(entry) => {
                // Ends the writer so the client sees the close and reconnects.
                entry.handle.mark_dead();
                if reaped {
                    self.metrics.connection_reaped();
                    info!(user_id = %user_id, conn_id = %connection_id, "Stale connection reaped");
                } else {
                    self.metrics.connection_closed();
                }
                self.broadcaster.broadcast();
                true
            }
            Err(e) if e.kind == ErrorKind::StalePresence => {
                self.metrics.stale_disconnect();
                debug!(user_id = %user_id, conn_id = %connection_id, "{}", e.message);
                false
            }
            Err(e) => {
                warn!(error = %e, "Unexpected disconnect failure");
                false
            }
        }
    }

    /// Processes an inbound frame from a client.
    pub async fn handle_inbound(&self, handle: &ConnectionHandle, raw: &str) {
        handle.touch().await;
        self.metrics.message_received();

        if let Err(e) = validate_inbound(raw, self.config.max_inbound_message_bytes) {
            handle.send(OutboundMessage::error("INVALID_MESSAGE", e.message));
            return;
        }

        match deserialize_inbound(raw) {
            Ok(InboundMessage::Ping { timestamp }) => {
                let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
                handle.send(OutboundMessage::Pong { timestamp });
            }
            Ok(InboundMessage::Pong { .. }) => {}
            Err(e) => {
                debug!(conn_id = %handle.id, error = %e, "Unparseable inbound frame");
                handle.send(OutboundMessage::error(
                    "INVALID_MESSAGE",
                    format!("Failed to parse message: {e}"),
                ));
            }
        }
    }

    /// Consumes lifecycle events until the channel closes or shutdown fires.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<ConnectionEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.apply(event);
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
        debug!("Connection event loop stopped");
    }

    /// Marks every registered connection dead and empties the registry.
    pub fn close_all(&self) {
        let handles = self.registry.clear();
        for handle in &handles {
            handle.mark_dead();
        }
        info!(count = handles.len(), "All connections closed");
    }

    /// Sender for lifecycle events.
    pub fn events(&self) -> mpsc::Sender<ConnectionEvent> {
        self.events.clone()
    }

    /// The presence registry.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        manager: ConnectionManager,
        events: mpsc::Receiver<ConnectionEvent>,
        metrics: Arc<RealtimeMetrics>,
    }

    impl Fixture {
        fn new() -> Self {
            let (tx, events) = mpsc::channel(64);
            let metrics = Arc::new(RealtimeMetrics::new());
            let manager = ConnectionManager::new(
                RealtimeConfig::default(),
                Arc::new(PresenceRegistry::new()),
                metrics.clone(),
                tx,
            );
            Self {
                manager,
                events,
                metrics,
            }
        }

        /// Apply every queued event.
        fn drain(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.manager.apply(event);
            }
        }
    }

    async fn online_set(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<UserId> {
        match rx.recv().await {
            Some(OutboundMessage::OnlineUsers { user_ids }) => user_ids,
            other => panic!("expected online_users, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_registers_and_broadcasts() {
        let mut fx = Fixture::new();
        let (u, v) = (UserId::new(), UserId::new());

        let (_hu, mut rx_u) = fx.manager.open(u).await.expect("open u");
        fx.drain();
        assert_eq!(online_set(&mut rx_u).await, vec![u]);

        let (_hv, mut rx_v) = fx.manager.open(v).await.expect("open v");
        fx.drain();
        let mut both = vec![u, v];
        both.sort();
        assert_eq!(online_set(&mut rx_u).await, both);
        assert_eq!(online_set(&mut rx_v).await, both);
    }

    #[tokio::test]
    async fn test_stale_close_is_swallowed() {
        let mut fx = Fixture::new();
        let u = UserId::new();

        let (c1, mut rx1) = fx.manager.open(u).await.expect("c1");
        fx.drain();
        let (c2, mut rx2) = fx.manager.open(u).await.expect("c2");
        fx.drain();
        assert_eq!(online_set(&mut rx1).await, vec![u]);
        assert_eq!(online_set(&mut rx2).await, vec![u]);

        fx.manager.close(&c1).await;
        fx.drain();

        assert_eq!(fx.manager.registry().lookup(u).map(|h| h.id), Some(c2.id));
        assert!(rx2.try_recv().is_err());
        let snapshot = fx.metrics.snapshot();
        assert_eq!(snapshot.connections_superseded, 1);
        assert_eq!(snapshot.stale_disconnects, 1);
        assert_eq!(snapshot.connections_closed, 0);
    }

    #[tokio::test]
    async fn test_close_removes_and_notifies_remaining() {
        let mut fx = Fixture::new();
        let (u, v) = (UserId::new(), UserId::new());

        let (hu, _rx_u) = fx.manager.open(u).await.expect("u");
        let (_hv, mut rx_v) = fx.manager.open(v).await.expect("v");
        fx.drain();
        online_set(&mut rx_v).await;

        fx.manager.close(&hu).await;
        fx.drain();

        assert_eq!(online_set(&mut rx_v).await, vec![v]);
        assert!(!fx.manager.registry().is_online(u));
    }

    #[tokio::test]
    async fn test_liveness_lost_reaps_current_connection() {
        let mut fx = Fixture::new();
        let u = UserId::new();
        let (hu, _rx) = fx.manager.open(u).await.expect("u");
        fx.drain();

        assert!(fx.manager.apply(ConnectionEvent::liveness_lost(&hu)));
        assert!(!fx.manager.registry().is_online(u));
        assert!(!fx.manager.apply(ConnectionEvent::liveness_lost(&hu)));
        assert_eq!(fx.metrics.snapshot().connections_reaped, 1);
    }

    #[tokio::test]
    async fn test_reaped_connection_writer_is_closed() {
        let mut fx = Fixture::new();
        let u = UserId::new();
        let (hu, mut rx) = fx.manager.open(u).await.expect("u");
        fx.drain();
        assert_eq!(online_set(&mut rx).await, vec![u]);

        assert!(fx.manager.apply(ConnectionEvent::liveness_lost(&hu)));

        assert!(!hu.is_alive());
        assert_eq!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );

        // A late frame from the client does not bring it back.
        fx.manager
            .handle_inbound(&hu, r#"{"type":"pong","timestamp":1}"#)
            .await;
        fx.drain();
        assert!(!fx.manager.registry().is_online(u));
    }

    #[tokio::test]
    async fn test_close_all_closes_writers() {
        let mut fx = Fixture::new();
        let (_h, mut rx) = fx.manager.open(UserId::new()).await.expect("open");
        fx.drain();
        online_set(&mut rx).await;

        fx.manager.close_all();

        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_inbound_ping_gets_pong() {
        let mut fx = Fixture::new();
        let (h, mut rx) = fx.manager.open(UserId::new()).await.expect("open");
        fx.drain();
        online_set(&mut rx).await;

        fx.manager
            .handle_inbound(&h, r#"{"type":"ping","timestamp":7}"#)
            .await;
        assert_eq!(rx.recv().await, Some(OutboundMessage::Pong { timestamp: 7 }));
    }

    #[tokio::test]
    async fn test_inbound_garbage_gets_error() {
        let mut fx = Fixture::new();
        let (h, mut rx) = fx.manager.open(UserId::new()).await.expect("open");
        fx.drain();
        online_set(&mut rx).await;

        fx.manager.handle_inbound(&h, "not json").await;
        match rx.recv().await {
            Some(OutboundMessage::Error { code, .. }) => assert_eq!(code, "INVALID_MESSAGE"),
            other => panic!("expected error frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_fails_without_event_loop() {
        let fx = Fixture::new();
        let Fixture {
            manager, events, ..
        } = fx;
        drop(events);
        let err = manager.open(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }
}
