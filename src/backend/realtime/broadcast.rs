/**
 * Room Hub
 *
 * Process-wide registry of live connections and the rooms they joined.
 * Room membership is the only routing boundary for broadcasts: an event
 * addressed to a room reaches exactly the connections that joined it.
 *
 * # Fan-out
 *
 * Each event is serialized once and the shared frame is pushed into every
 * recipient's outbound queue without blocking. A full queue drops the frame
 * for that connection only.
 *
 * # Locking
 *
 * A single `RwLock` guards the connection table and the room index together,
 * so a connection is never routed to after `remove` returns.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::backend::realtime::connection::{ConnectionHandle, ConnectionId};
use crate::backend::realtime::rooms::Room;
use crate::shared::ServerEvent;

#[derive(Default)]
struct HubInner {
    connections: HashMap<ConnectionId, Arc<ConnectionHandle>>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
    joined: HashMap<ConnectionId, HashSet<Room>>,
}

/// Live connections indexed by id and by room
#[derive(Default)]
pub struct RoomHub {
    inner: RwLock<HubInner>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, handle: Arc<ConnectionHandle>) {
        let mut inner = self.inner.write().await;
        inner.connections.insert(handle.id, handle);
    }

    /// Drop a connection and all of its room subscriptions
    pub async fn remove(&self, connection_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let mut inner = self.inner.write().await;
        Self::leave_all_locked(&mut inner, connection_id);
        inner.connections.remove(&connection_id)
    }

    pub async fn join(&self, connection_id: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(&connection_id) {
            tracing::debug!("[Realtime] Ignoring join of {} for unknown connection {}", room, connection_id);
            return;
        }
        inner.rooms.entry(room).or_default().insert(connection_id);
        inner.joined.entry(connection_id).or_default().insert(room);
    }

    /// Leave every joined room, returning the rooms that were left
    pub async fn leave_all(&self, connection_id: ConnectionId) -> Vec<Room> {
        let mut inner = self.inner.write().await;
        Self::leave_all_locked(&mut inner, connection_id)
    }

    fn leave_all_locked(inner: &mut HubInner, connection_id: ConnectionId) -> Vec<Room> {
        let rooms: Vec<Room> = inner
            .joined
            .remove(&connection_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            if let Some(members) = inner.rooms.get_mut(room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    inner.rooms.remove(room);
                }
            }
        }
        rooms
    }

    pub async fn is_joined(&self, connection_id: ConnectionId, room: Room) -> bool {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains(&connection_id))
    }

    /// Send to every connection in a room
    ///
    /// # Returns
    /// Number of connections the frame was queued for
    pub async fn broadcast(&self, room: Room, event: &ServerEvent) -> usize {
        self.broadcast_to_room(room, event, None).await
    }

    /// Send to every connection in a room except one
    pub async fn broadcast_except(
        &self,
        room: Room,
        event: &ServerEvent,
        except: ConnectionId,
    ) -> usize {
        self.broadcast_to_room(room, event, Some(except)).await
    }

    /// Send to every live connection except one
    pub async fn broadcast_all_except(&self, event: &ServerEvent, except: ConnectionId) -> usize {
        let Some(frame) = encode(event) else { return 0 };
        let inner = self.inner.read().await;
        let recipients = inner
            .connections
            .values()
            .filter(|conn| conn.id != except)
            .filter(|conn| deliver(conn, &frame))
            .count();
        tracing::debug!("[Realtime] {} sent to {} connections", event.name(), recipients);
        recipients
    }

    async fn broadcast_to_room(
        &self,
        room: Room,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let Some(frame) = encode(event) else { return 0 };
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&room) else {
            tracing::debug!("[Realtime] {} to {}: room is empty", event.name(), room);
            return 0;
        };

        let recipients = members
            .iter()
            .filter(|id| Some(**id) != except)
            .filter_map(|id| inner.connections.get(id))
            .filter(|conn| deliver(conn, &frame))
            .count();
        tracing::debug!("[Realtime] {} to {} reached {} connections", event.name(), room, recipients);
        recipients
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    pub async fn room_size(&self, room: Room) -> usize {
        let inner = self.inner.read().await;
        inner.rooms.get(&room).map_or(0, HashSet::len)
    }

    /// Forget connections whose socket task is gone and rooms left empty
    ///
    /// # Returns
    /// Number of stale connections removed
    pub async fn cleanup_inactive_rooms(&self) -> usize {
        let mut inner = self.inner.write().await;
        let stale: Vec<ConnectionId> = inner
            .connections
            .values()
            .filter(|conn| conn.is_closed())
            .map(|conn| conn.id)
            .collect();
        for id in &stale {
            Self::leave_all_locked(&mut inner, *id);
            inner.connections.remove(id);
        }
        inner.rooms.retain(|_, members| !members.is_empty());
        stale.len()
    }
}

fn encode(event: &ServerEvent) -> Option<Arc<String>> {
    match event.to_text() {
        Ok(text) => Some(Arc::new(text)),
        Err(e) => {
            tracing::warn!("[Realtime] Failed to serialize {}: {}", event.name(), e);
            None
        }
    }
}

fn deliver(conn: &ConnectionHandle, frame: &Arc<String>) -> bool {
    if conn.send(Arc::clone(frame)) {
        return true;
    }
    tracing::warn!(
        "[Realtime] Dropped frame for connection {} (total drops: {})",
        conn.id,
        conn.drop_count()
    );
    false
}
