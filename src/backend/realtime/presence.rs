/**
 * Presence Registry
 *
 * Tracks which users have at least one live connection. A user may be
 * connected from several devices; they go online with their first
 * connection and offline when their last one closes, and each transition
 * is broadcast exactly once.
 *
 * # Locking
 *
 * Every check-and-mutate happens under one write lock, so concurrent
 * registrations and removals for the same user cannot lose entries. Status
 * broadcasts are queued before that lock is released, so peers see a
 * user's transitions in the order they happened. The hub never takes the
 * presence lock, and queuing a frame never blocks.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::realtime::broadcast::RoomHub;
use crate::backend::realtime::connection::ConnectionId;
use crate::shared::error::SharedError;
use crate::shared::event::{ServerEvent, MAX_STATUS_LEN, STATUS_OFFLINE, STATUS_ONLINE};

#[derive(Debug)]
struct PresenceEntry {
    connections: HashSet<ConnectionId>,
    status: String,
}

pub struct PresenceRegistry {
    entries: RwLock<HashMap<Uuid, PresenceEntry>>,
    hub: Arc<RoomHub>,
}

impl PresenceRegistry {
    pub fn new(hub: Arc<RoomHub>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hub,
        }
    }

    /// Record a live connection
    ///
    /// # Returns
    /// `true` if this was the user's first connection
    pub async fn register(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&user_id) {
            entry.connections.insert(connection_id);
            tracing::debug!("[Presence] User {} opened another connection", user_id);
            return false;
        }

        entries.insert(
            user_id,
            PresenceEntry {
                connections: HashSet::from([connection_id]),
                status: STATUS_ONLINE.to_string(),
            },
        );
        tracing::info!("[Presence] User {} is online", user_id);
        // queued under the lock so transitions reach peers in order
        self.announce(user_id, STATUS_ONLINE, connection_id).await;
        true
    }

    /// Forget a connection
    ///
    /// # Returns
    /// `true` if this was the user's last connection
    pub async fn unregister(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        let went_offline = match entries.get_mut(&user_id) {
            Some(entry) => {
                entry.connections.remove(&connection_id) && entry.connections.is_empty()
            }
            None => false,
        };
        if !went_offline {
            return false;
        }

        entries.remove(&user_id);
        tracing::info!("[Presence] User {} is offline", user_id);
        self.announce(user_id, STATUS_OFFLINE, connection_id).await;
        true
    }

    /// Store a transient status and tell everyone but the origin connection
    ///
    /// A user with no live connection has nothing to announce.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        status: &str,
        origin: ConnectionId,
    ) -> Result<(), SharedError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(SharedError::validation("status", "Status cannot be empty"));
        }
        if status.chars().count() > MAX_STATUS_LEN {
            return Err(SharedError::validation(
                "status",
                format!("Status exceeds {} characters", MAX_STATUS_LEN),
            ));
        }

        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&user_id) else {
            tracing::debug!("[Presence] Ignoring status for offline user {}", user_id);
            return Ok(());
        };
        entry.status = status.to_string();
        self.announce(user_id, status, origin).await;
        Ok(())
    }

    /// Users with at least one live connection, sorted
    pub async fn online_users(&self) -> Vec<Uuid> {
        let entries = self.entries.read().await;
        let mut users: Vec<Uuid> = entries.keys().copied().collect();
        users.sort();
        users
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.entries.read().await.contains_key(&user_id)
    }

    pub async fn status_of(&self, user_id: Uuid) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(&user_id).map(|entry| entry.status.clone())
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        let entries = self.entries.read().await;
        entries.get(&user_id).map_or(0, |entry| entry.connections.len())
    }

    async fn announce(&self, user_id: Uuid, status: &str, origin: ConnectionId) {
        let event = ServerEvent::UserStatusChanged {
            user_id,
            status: status.to_string(),
        };
        self.hub.broadcast_all_except(&event, origin).await;
    }
}
