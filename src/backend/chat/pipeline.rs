/**
 * Message Pipeline
 *
 * Each send moves through `received -> authorized -> persisted -> delivered`.
 * Validation or authorization failures reject the message before anything is
 * stored; a storage failure stops it before anything is broadcast. Either
 * way the error goes back to the sender only.
 *
 * # Authorization
 *
 * - Personal messages need only an existing receiver.
 * - Project and workspace messages re-check live membership at send time.
 *   Connect-time room joins are never trusted for this.
 *
 * # Delivery
 *
 * - Personal messages go to the receiver's private room.
 * - Group messages go to the group room, including the sender's own
 *   connections.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::{Room, RoomHub};
use crate::backend::store::{Group, MembershipResolver, MessageStore, UserStore};
use crate::shared::error::SharedError;
use crate::shared::event::AttachmentInput;
use crate::shared::message::{
    timestamp_now, validate_content, Destination, Message, MAX_ATTACHMENT_SIZE,
};
use crate::shared::ServerEvent;

/// Group a destination refers to, if any
pub fn destination_group(destination: Destination) -> Option<Group> {
    match destination {
        Destination::Personal { .. } => None,
        Destination::Project { project } => Some(Group::Project(project)),
        Destination::Workspace { workspace } => Some(Group::Workspace(workspace)),
    }
}

#[derive(Clone)]
pub struct MessagePipeline {
    hub: Arc<RoomHub>,
    messages: Arc<dyn MessageStore>,
    membership: Arc<dyn MembershipResolver>,
    users: Arc<dyn UserStore>,
}

impl MessagePipeline {
    pub fn new(
        hub: Arc<RoomHub>,
        messages: Arc<dyn MessageStore>,
        membership: Arc<dyn MembershipResolver>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            hub,
            messages,
            membership,
            users,
        }
    }

    /// Validate, authorize, persist and broadcast one message
    ///
    /// # Returns
    /// The stored message, for the sender's acknowledgement
    pub async fn send(
        &self,
        sender: Uuid,
        destination: Destination,
        content: &str,
        attachments: Vec<AttachmentInput>,
    ) -> Result<Message, BackendError> {
        let content = validate_content(content, !attachments.is_empty())?;
        for attachment in &attachments {
            validate_attachment(attachment)?;
        }

        self.authorize_send(sender, destination).await?;

        let attachments = attachments
            .into_iter()
            .map(|a| a.into_attachment(sender))
            .collect();
        let message = Message::new(sender, destination, content, attachments);

        self.messages.create(&message).await.map_err(|e| {
            tracing::error!("[Pipeline] Failed to persist message {}: {:?}", message.id, e);
            BackendError::from(e)
        })?;

        let room = Room::from(destination);
        let recipients = self
            .hub
            .broadcast(room, &ServerEvent::new_message(message.clone()))
            .await;
        tracing::info!(
            "[Pipeline] {} message {} from {} delivered to {} connections",
            message.kind().as_str(),
            message.id,
            sender,
            recipients
        );

        Ok(message)
    }

    async fn authorize_send(&self, sender: Uuid, destination: Destination) -> Result<(), BackendError> {
        match destination {
            Destination::Personal { receiver } => {
                if !self.users.exists(receiver).await? {
                    return Err(BackendError::not_found("Receiver"));
                }
            }
            Destination::Project { project } => {
                self.require_member(sender, Group::Project(project)).await?
            }
            Destination::Workspace { workspace } => {
                self.require_member(sender, Group::Workspace(workspace)).await?
            }
        }
        Ok(())
    }

    async fn require_member(&self, user_id: Uuid, group: Group) -> Result<(), BackendError> {
        if self.membership.is_member(user_id, group).await? {
            Ok(())
        } else {
            tracing::warn!("[Pipeline] Rejected message from {}: not a member of {}", user_id, group);
            Err(BackendError::NotAuthorized)
        }
    }

    /// Record that `reader` has read a message
    ///
    /// The reader must be a participant of a personal message or a current
    /// member of the message's group. The first receipt per reader wins.
    pub async fn mark_read(&self, reader: Uuid, message_id: Uuid) -> Result<Message, BackendError> {
        let mut message = self
            .messages
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Message"))?;

        match destination_group(message.destination) {
            None => {
                let is_participant = match message.destination {
                    Destination::Personal { receiver } => {
                        reader == receiver || reader == message.sender
                    }
                    _ => false,
                };
                if !is_participant {
                    return Err(BackendError::NotAuthorized);
                }
            }
            Some(group) => self.require_member(reader, group).await?,
        }

        let read_at = timestamp_now();
        if self
            .messages
            .append_read_receipt(message_id, reader, read_at)
            .await?
        {
            message.mark_read(reader, read_at);
            tracing::debug!("[Pipeline] {} read message {}", reader, message_id);
        }

        Ok(message)
    }
}

fn validate_attachment(attachment: &AttachmentInput) -> Result<(), SharedError> {
    if attachment.filename.trim().is_empty() {
        return Err(SharedError::validation("attachments.filename", "Filename cannot be empty"));
    }
    if attachment.url.trim().is_empty() {
        return Err(SharedError::validation("attachments.url", "URL cannot be empty"));
    }
    if attachment.size > MAX_ATTACHMENT_SIZE {
        return Err(SharedError::validation(
            "attachments.size",
            format!("Attachment size exceeds {} bytes", MAX_ATTACHMENT_SIZE),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::ConnectionHandle;
    use crate::backend::store::SqliteStore;
    use crate::backend::{auth, groups};
    use assert_matches::assert_matches;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::mpsc;

    struct Fixture {
        store: Arc<SqliteStore>,
        hub: Arc<RoomHub>,
        pipeline: MessagePipeline,
    }

    async fn fixture() -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        let store = Arc::new(SqliteStore::new(pool));
        let hub = Arc::new(RoomHub::new());
        let pipeline = MessagePipeline::new(hub.clone(), store.clone(), store.clone(), store.clone());
        Fixture { store, hub, pipeline }
    }

    async fn listen(hub: &RoomHub, user_id: Uuid, room: Room) -> mpsc::Receiver<Arc<String>> {
        let (tx, rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(user_id, tx));
        hub.add(handle.clone()).await;
        hub.join(handle.id, room).await;
        rx
    }

    #[tokio::test]
    async fn test_personal_message_reaches_receiver_only() {
        let fx = fixture().await;
        let pool = fx.store.pool();
        let alice = auth::users::create_user(pool, "alice", "alice@example.com").await.unwrap();
        let bob = auth::users::create_user(pool, "bob", "bob@example.com").await.unwrap();

        let mut bob_rx = listen(&fx.hub, bob.id, Room::User(bob.id)).await;
        let mut alice_rx = listen(&fx.hub, alice.id, Room::User(alice.id)).await;

        let message = fx
            .pipeline
            .send(alice.id, Destination::Personal { receiver: bob.id }, " hi ", vec![])
            .await
            .unwrap();
        assert_eq!(message.content, "hi");
        assert_eq!(message.read_by.len(), 1);

        let frame = bob_rx.try_recv().unwrap();
        let event: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert_eq!(event, ServerEvent::NewPersonalMessage(message));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_personal_message_to_unknown_receiver() {
        let fx = fixture().await;
        let alice = auth::users::create_user(fx.store.pool(), "alice", "alice@example.com")
            .await
            .unwrap();
        let result = fx
            .pipeline
            .send(alice.id, Destination::Personal { receiver: Uuid::new_v4() }, "hi", vec![])
            .await;
        assert_matches!(result, Err(BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_member_rejected_without_persisting() {
        let fx = fixture().await;
        let pool = fx.store.pool();
        let mallory = auth::users::create_user(pool, "mallory", "m@example.com").await.unwrap();
        let workspace = groups::db::create_workspace(pool, "Acme").await.unwrap();
        let project = groups::db::create_project(pool, workspace, "Secret").await.unwrap();

        // joined the room but holds no membership
        let mut rx = listen(&fx.hub, mallory.id, Room::Project(project)).await;

        let result = fx
            .pipeline
            .send(mallory.id, Destination::Project { project }, "let me in", vec![])
            .await;
        assert_matches!(result, Err(BackendError::NotAuthorized));
        assert!(rx.try_recv().is_err());

        let history = fx.store.group_history(Group::Project(project), 10).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let fx = fixture().await;
        let result = fx
            .pipeline
            .send(Uuid::new_v4(), Destination::Project { project: Uuid::new_v4() }, "   ", vec![])
            .await;
        assert_matches!(result, Err(BackendError::Validation(_)));
    }

    #[tokio::test]
    async fn test_oversized_attachment_rejected_before_storage() {
        let fx = fixture().await;
        let pool = fx.store.pool();
        let alice = auth::users::create_user(pool, "alice", "alice@example.com").await.unwrap();
        let bob = auth::users::create_user(pool, "bob", "bob@example.com").await.unwrap();
        let mut bob_rx = listen(&fx.hub, bob.id, Room::User(bob.id)).await;

        let attachment = |size| AttachmentInput {
            filename: "disk.img".to_string(),
            url: "https://files.example.com/disk.img".to_string(),
            content_type: "application/octet-stream".to_string(),
            size,
            uploaded_at: None,
        };

        let result = fx
            .pipeline
            .send(alice.id, Destination::Personal { receiver: bob.id }, "", vec![attachment(u64::MAX)])
            .await;
        assert_matches!(
            result,
            Err(BackendError::Validation(SharedError::ValidationError { ref field, .. }))
                if field == "attachments.size"
        );
        assert!(bob_rx.try_recv().is_err());
        let history = fx.store.personal_history(alice.id, bob.id, 10).await.unwrap();
        assert!(history.is_empty());

        // the largest storable size survives a round trip unchanged
        let sent = fx
            .pipeline
            .send(
                alice.id,
                Destination::Personal { receiver: bob.id },
                "",
                vec![attachment(MAX_ATTACHMENT_SIZE)],
            )
            .await
            .unwrap();
        let stored = MessageStore::find_by_id(fx.store.as_ref(), sent.id).await.unwrap();
        assert_eq!(stored, Some(sent));
    }

    #[tokio::test]
    async fn test_mark_read_requires_participation() {
        let fx = fixture().await;
        let pool = fx.store.pool();
        let alice = auth::users::create_user(pool, "alice", "alice@example.com").await.unwrap();
        let bob = auth::users::create_user(pool, "bob", "bob@example.com").await.unwrap();
        let eve = auth::users::create_user(pool, "eve", "eve@example.com").await.unwrap();

        let message = fx
            .pipeline
            .send(alice.id, Destination::Personal { receiver: bob.id }, "secret", vec![])
            .await
            .unwrap();

        assert_matches!(
            fx.pipeline.mark_read(eve.id, message.id).await,
            Err(BackendError::NotAuthorized)
        );

        let first = fx.pipeline.mark_read(bob.id, message.id).await.unwrap();
        let second = fx.pipeline.mark_read(bob.id, message.id).await.unwrap();
        let bob_receipts: Vec<_> = second.read_by.iter().filter(|r| r.reader == bob.id).collect();
        assert_eq!(bob_receipts.len(), 1);
        assert_eq!(Some(bob_receipts[0]), first.read_by.iter().find(|r| r.reader == bob.id));
    }

    #[tokio::test]
    async fn test_mark_read_unknown_message() {
        let fx = fixture().await;
        assert_matches!(
            fx.pipeline.mark_read(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(BackendError::NotFound { .. })
        );
    }
}
