//! Presence registry: identity → its single live connection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{ConnectionId, UserId};

use crate::connection::handle::ConnectionHandle;

/// The registered connection of one online identity.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    /// Online identity.
    pub identity: UserId,
    /// Its current connection.
    pub handle: Arc<ConnectionHandle>,
    /// When this entry was registered.
    pub connected_at: DateTime<Utc>,
}

/// Thread-safe map from identity to its most recent connection.
///
/// At most one entry per identity. A newer connection silently supersedes
/// an older one, and a disconnect only removes the entry if it still
/// belongs to the connection that is going away.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: DashMap<UserId, PresenceEntry>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` as its identity's connection.
    ///
    /// Returns the entry it replaced, if any.
    pub fn connect(&self, handle: Arc<ConnectionHandle>) -> Option<PresenceEntry> {
        let identity = handle.user_id;
        self.entries.insert(
            identity,
            PresenceEntry {
                identity,
                handle,
                connected_at: Utc::now(),
            },
        )
    }

    /// Removes `identity` only if its entry belongs to `connection_id`.
    ///
    /// Fails with `StalePresence` when the identity is absent or has since
    /// been taken over by another connection.
    pub fn disconnect(
        &self,
        identity: UserId,
        connection_id: ConnectionId,
    ) -> AppResult<PresenceEntry> {
        self.entries
            .remove_if(&identity, |_, entry| entry.handle.id == connection_id)
            .map(|(_, entry)| entry)
            .ok_or_else(|| {
                AppError::stale_presence(format!(
                    "Connection {connection_id} no longer registered for {identity}"
                ))
            })
    }

    /// The current connection of `identity`, if online.
    pub fn lookup(&self, identity: UserId) -> Option<Arc<ConnectionHandle>> {
        self.entries.get(&identity).map(|e| e.handle.clone())
    }

    /// Whether `identity` has a registered connection.
    pub fn is_online(&self, identity: UserId) -> bool {
        self.entries.contains_key(&identity)
    }

    /// All online identities, sorted.
    pub fn snapshot(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.entries.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    /// Every registered connection.
    pub fn handles(&self) -> Vec<Arc<ConnectionHandle>> {
        self.entries.iter().map(|e| e.handle.clone()).collect()
    }

    /// Number of online identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is online.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and returns the removed handles.
    pub fn clear(&self) -> Vec<Arc<ConnectionHandle>> {
        let handles = self.handles();
        self.entries.clear();
        handles
    }
}
