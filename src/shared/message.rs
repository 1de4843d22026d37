//! Chat Message Data Structure
//!
//! A message has exactly one destination: a receiver for personal messages,
//! a project, or a workspace. The destination is a tagged enum flattened
//! into the message, so the serialized form carries `type` alongside the one
//! matching id field:
//!
//! ```json
//! {"id":"..","sender":"..","type":"workspace","workspace":"..","content":"hi",
//!  "attachments":[],"readBy":[{"reader":"..","readAt":".."}],"createdAt":".."}
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest accepted message body, in characters
pub const MAX_CONTENT_LEN: usize = 10_000;

/// Largest attachment size that storage holds without loss
pub const MAX_ATTACHMENT_SIZE: u64 = i64::MAX as u64;

/// Current time at millisecond precision, so values survive storage unchanged
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Message class, as stored in the `kind` column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Personal,
    Project,
    Workspace,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Personal => "personal",
            MessageKind::Project => "project",
            MessageKind::Workspace => "workspace",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(MessageKind::Personal),
            "project" => Some(MessageKind::Project),
            "workspace" => Some(MessageKind::Workspace),
            _ => None,
        }
    }
}

/// Where a message is addressed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Destination {
    Personal { receiver: Uuid },
    Project { project: Uuid },
    Workspace { workspace: Uuid },
}

impl Destination {
    pub fn kind(&self) -> MessageKind {
        match self {
            Destination::Personal { .. } => MessageKind::Personal,
            Destination::Project { .. } => MessageKind::Project,
            Destination::Workspace { .. } => MessageKind::Workspace,
        }
    }
}

/// File attached to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub uploader: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

/// A reader and the moment they first read the message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub reader: Uuid,
    pub read_at: DateTime<Utc>,
}

/// Represents a persisted chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// User who sent the message
    pub sender: Uuid,
    /// Receiver, project or workspace
    #[serde(flatten)]
    pub destination: Destination,
    /// Message body
    pub content: String,
    /// Attachments in upload order
    pub attachments: Vec<Attachment>,
    /// Read receipts in the order they were recorded
    pub read_by: Vec<ReadReceipt>,
    /// When the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message, already read by its sender
    pub fn new(
        sender: Uuid,
        destination: Destination,
        content: String,
        attachments: Vec<Attachment>,
    ) -> Self {
        let created_at = timestamp_now();
        Self {
            id: Uuid::new_v4(),
            sender,
            destination,
            content,
            attachments,
            read_by: vec![ReadReceipt {
                reader: sender,
                read_at: created_at,
            }],
            created_at,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.destination.kind()
    }

    pub fn is_read_by(&self, reader: Uuid) -> bool {
        self.read_by.iter().any(|r| r.reader == reader)
    }

    /// Record a read receipt. The first receipt per reader wins; returns
    /// `false` when the reader already had one.
    pub fn mark_read(&mut self, reader: Uuid, read_at: DateTime<Utc>) -> bool {
        if self.is_read_by(reader) {
            return false;
        }
        self.read_by.push(ReadReceipt { reader, read_at });
        true
    }
}

/// Trim and check a message body
///
/// Blank content is only accepted when the message carries attachments.
pub fn validate_content(content: &str, has_attachments: bool) -> Result<String, SharedError> {
    let trimmed = content.trim();
    if trimmed.is_empty() && !has_attachments {
        return Err(SharedError::validation(
            "content",
            "Message content cannot be empty",
        ));
    }
    if trimmed.chars().count() > MAX_CONTENT_LEN {
        return Err(SharedError::validation(
            "content",
            format!("Message content exceeds {} characters", MAX_CONTENT_LEN),
        ));
    }
    Ok(trimmed.to_string())
}
