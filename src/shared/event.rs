/**
 * Socket Event Protocol
 *
 * Every socket frame is a JSON text frame shaped as
 * `{"event": <name>, "data": <payload>, "ackId": <number>}`.
 *
 * Inbound frames may carry an `ackId`; the server answers such frames with
 * an `ack` event carrying the same id, sent only to the originating
 * connection. Broadcast events never carry an ack id.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::message::{timestamp_now, Attachment, Destination, Message, MessageKind};

/// Status broadcast when a user's first connection opens
pub const STATUS_ONLINE: &str = "online";
/// Status broadcast when a user's last connection closes
pub const STATUS_OFFLINE: &str = "offline";
/// Longest custom status accepted from `setStatus`
pub const MAX_STATUS_LEN: usize = 64;

/// Raw inbound frame before the payload is decoded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode the payload into a typed event, returning the ack id alongside
    pub fn into_event(self) -> Result<(Option<u64>, ClientEvent), SharedError> {
        if !ClientEvent::NAMES.contains(&self.event.as_str()) {
            return Err(SharedError::protocol(format!("unknown event '{}'", self.event)));
        }
        let ack_id = self.ack_id;
        let event = serde_json::from_value(serde_json::json!({
            "event": self.event,
            "data": self.data,
        }))?;
        Ok((ack_id, event))
    }
}

/// Attachment descriptor as sent by a client
///
/// The uploader is always the sending user; a missing upload time defaults
/// to the moment the message is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl AttachmentInput {
    pub fn into_attachment(self, uploader: Uuid) -> Attachment {
        use chrono::SubsecRound;
        Attachment {
            filename: self.filename,
            url: self.url,
            content_type: self.content_type,
            size: self.size,
            uploader,
            uploaded_at: self
                .uploaded_at
                .map(|t| t.trunc_subsecs(3))
                .unwrap_or_else(timestamp_now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    pub task_id: Uuid,
    #[serde(default)]
    pub update: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendPersonalMessageRequest {
    pub receiver_id: Uuid,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendProjectMessageRequest {
    pub project_id: Uuid,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendWorkspaceMessageRequest {
    pub workspace_id: Uuid,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub workspace_id: Option<Uuid>,
    pub is_typing: bool,
}

impl TypingRequest {
    /// First present of receiver, project, workspace
    pub fn destination(&self) -> Option<Destination> {
        if let Some(receiver) = self.receiver_id {
            return Some(Destination::Personal { receiver });
        }
        if let Some(project) = self.project_id {
            return Some(Destination::Project { project });
        }
        self.workspace_id
            .map(|workspace| Destination::Workspace { workspace })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkMessageReadRequest {
    pub message_id: Uuid,
}

/// Events a client may emit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    TaskUpdate(TaskUpdateRequest),
    SetStatus(SetStatusRequest),
    SendPersonalMessage(SendPersonalMessageRequest),
    SendProjectMessage(SendProjectMessageRequest),
    SendWorkspaceMessage(SendWorkspaceMessageRequest),
    Typing(TypingRequest),
    MarkMessageRead(MarkMessageReadRequest),
}

impl ClientEvent {
    pub const NAMES: [&'static str; 7] = [
        "taskUpdate",
        "setStatus",
        "sendPersonalMessage",
        "sendProjectMessage",
        "sendWorkspaceMessage",
        "typing",
        "markMessageRead",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::TaskUpdate(_) => "taskUpdate",
            ClientEvent::SetStatus(_) => "setStatus",
            ClientEvent::SendPersonalMessage(_) => "sendPersonalMessage",
            ClientEvent::SendProjectMessage(_) => "sendProjectMessage",
            ClientEvent::SendWorkspaceMessage(_) => "sendWorkspaceMessage",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::MarkMessageRead(_) => "markMessageRead",
        }
    }
}

/// Reply to an inbound frame that carried an `ackId`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok(ack_id: Option<u64>, data: Value) -> Self {
        Self {
            ack_id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(ack_id: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            ack_id,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Events the server pushes to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once rooms are joined and presence is registered
    #[serde(rename_all = "camelCase")]
    Connected {
        user_id: Uuid,
        rooms: Vec<String>,
        online_users: Vec<Uuid>,
    },
    #[serde(rename_all = "camelCase")]
    UserStatusChanged { user_id: Uuid, status: String },
    TaskUpdated { message: String, update: Value },
    TaskError { message: String },
    NewPersonalMessage(Message),
    NewProjectMessage(Message),
    NewWorkspaceMessage(Message),
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: Uuid, is_typing: bool },
    Ack(Ack),
    Error { message: String },
}

impl ServerEvent {
    /// Wrap a message in the broadcast event matching its class
    pub fn new_message(message: Message) -> Self {
        match message.kind() {
            MessageKind::Personal => ServerEvent::NewPersonalMessage(message),
            MessageKind::Project => ServerEvent::NewProjectMessage(message),
            MessageKind::Workspace => ServerEvent::NewWorkspaceMessage(message),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::UserStatusChanged { .. } => "userStatusChanged",
            ServerEvent::TaskUpdated { .. } => "taskUpdated",
            ServerEvent::TaskError { .. } => "taskError",
            ServerEvent::NewPersonalMessage(_) => "newPersonalMessage",
            ServerEvent::NewProjectMessage(_) => "newProjectMessage",
            ServerEvent::NewWorkspaceMessage(_) => "newWorkspaceMessage",
            ServerEvent::UserTyping { .. } => "userTyping",
            ServerEvent::Ack(_) => "ack",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn to_text(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
