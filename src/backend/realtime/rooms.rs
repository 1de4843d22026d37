/**
 * Room Manager
 *
 * Subscribes a fresh connection to one room per group membership plus the
 * user's private room. The room set is a snapshot taken at connect time and
 * refreshed only on reconnect; authorization never relies on it.
 */

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::RoomHub;
use crate::backend::realtime::connection::{ConnectionHandle, ConnectionId};
use crate::backend::store::{Group, MembershipResolver};
use crate::shared::Destination;

/// Broadcast routing target
///
/// Typed so a user id can never be mistaken for a group id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    User(Uuid),
    Project(Uuid),
    Workspace(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{}", id),
            Room::Project(id) => write!(f, "project:{}", id),
            Room::Workspace(id) => write!(f, "workspace:{}", id),
        }
    }
}

impl From<Group> for Room {
    fn from(group: Group) -> Self {
        match group {
            Group::Workspace(id) => Room::Workspace(id),
            Group::Project(id) => Room::Project(id),
        }
    }
}

impl From<Destination> for Room {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Personal { receiver } => Room::User(receiver),
            Destination::Project { project } => Room::Project(project),
            Destination::Workspace { workspace } => Room::Workspace(workspace),
        }
    }
}

#[derive(Clone)]
pub struct RoomManager {
    hub: Arc<RoomHub>,
    membership: Arc<dyn MembershipResolver>,
}

impl RoomManager {
    pub fn new(hub: Arc<RoomHub>, membership: Arc<dyn MembershipResolver>) -> Self {
        Self { hub, membership }
    }

    /// Join the private room and every group room of the connection's user
    ///
    /// The private room is joined before the membership lookup, so a storage
    /// failure still leaves the connection addressable.
    pub async fn join_group_rooms(&self, handle: &ConnectionHandle) -> Result<Vec<Room>, BackendError> {
        let private = Room::User(handle.user_id);
        self.hub.join(handle.id, private).await;

        let groups = self.membership.groups_for_user(handle.user_id).await?;
        let mut rooms = Vec::with_capacity(groups.len() + 1);
        rooms.push(private);
        for group in groups {
            let room = Room::from(group);
            self.hub.join(handle.id, room).await;
            rooms.push(room);
        }

        tracing::debug!(
            "[Rooms] Connection {} of user {} joined {} rooms",
            handle.id,
            handle.user_id,
            rooms.len()
        );
        Ok(rooms)
    }

    pub async fn leave_all(&self, connection_id: ConnectionId) -> Vec<Room> {
        self.hub.leave_all(connection_id).await
    }
}
