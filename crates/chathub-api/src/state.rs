//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use chathub_core::config::AppConfig;
use chathub_database::MessageStore;
use chathub_realtime::server::RealtimeEngine;
use chathub_service::{ConversationService, DeliveryCoordinator, UnseenAggregator};

use crate::extractors::auth::{AuthGate, TrustedHeaderGate};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Message store backend
    pub store: Arc<dyn MessageStore>,
    /// Real-time engine
    pub realtime: RealtimeEngine,
    /// Identity gate
    pub auth: Arc<dyn AuthGate>,
    /// Persist-then-push delivery
    pub delivery: Arc<DeliveryCoordinator>,
    /// Conversation reads and seen updates
    pub conversations: Arc<ConversationService>,
    /// Sidebar unseen counts
    pub unseen: Arc<UnseenAggregator>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Wires services around a store and a running engine, with the
    /// trusted-header identity gate from configuration.
    pub fn new(config: AppConfig, store: Arc<dyn MessageStore>, realtime: RealtimeEngine) -> Self {
        let auth = Arc::new(TrustedHeaderGate::new(&config.auth.identity_header));
        Self::with_auth(config, store, realtime, auth)
    }

    /// Like [`AppState::new`] with a custom identity gate.
    pub fn with_auth(
        config: AppConfig,
        store: Arc<dyn MessageStore>,
        realtime: RealtimeEngine,
        auth: Arc<dyn AuthGate>,
    ) -> Self {
        let delivery = Arc::new(DeliveryCoordinator::with_engine(store.clone(), &realtime));
        let conversations = Arc::new(ConversationService::new(store.clone()));
        let unseen = Arc::new(UnseenAggregator::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            realtime,
            auth,
            delivery,
            conversations,
            unseen,
            started_at: Instant::now(),
        }
    }
}
