/**
 * Typing Indicator Relay
 *
 * Typing signals are relayed without being persisted.
 *
 * # Routing
 *
 * The destination is the first present of `receiverId`, `projectId` and
 * `workspaceId`:
 * - Direct typing goes to the receiver's private room.
 * - Group typing goes to the group room, but only if the typing connection
 *   joined that room at connect time.
 *
 * The typing connection itself never receives its own indicator.
 */

use crate::backend::realtime::{ConnectionHandle, Room, RoomHub};
use crate::shared::event::{ServerEvent, TypingRequest};
use crate::shared::Destination;

/// Relay a typing indicator
///
/// # Returns
/// Number of connections the indicator was delivered to
pub async fn relay_typing(hub: &RoomHub, origin: &ConnectionHandle, request: &TypingRequest) -> usize {
    let Some(destination) = request.destination() else {
        tracing::debug!("[Typing] Dropping indicator from {} with no destination", origin.user_id);
        return 0;
    };

    let room = Room::from(destination);
    if !matches!(destination, Destination::Personal { .. }) && !hub.is_joined(origin.id, room).await {
        tracing::debug!(
            "[Typing] Dropping indicator from {}: connection is not in {}",
            origin.user_id,
            room
        );
        return 0;
    }

    let event = ServerEvent::UserTyping {
        user_id: origin.user_id,
        is_typing: request.is_typing,
    };
    hub.broadcast_except(room, &event, origin.id).await
}
