/**
 * Database Operations for Chat Messages
 *
 * A message is stored across three tables: the message row itself, its
 * attachments (ordered by `position`) and its read receipts (ordered by
 * insertion `seq`). Messages are ordered by `seq`, which follows creation
 * order.
 *
 * Read receipts are unique per `(message_id, reader_id)`; appends use
 * `INSERT OR IGNORE`, so the first receipt for a reader wins.
 */

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::store::Group;
use crate::shared::message::{Attachment, Destination, Message, MessageKind, ReadReceipt};

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    kind: String,
    sender_id: Uuid,
    receiver_id: Option<Uuid>,
    project_id: Option<Uuid>,
    workspace_id: Option<Uuid>,
    content: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn destination(&self) -> Result<Destination, sqlx::Error> {
        let destination = match MessageKind::parse(&self.kind) {
            Some(MessageKind::Personal) => self
                .receiver_id
                .map(|receiver| Destination::Personal { receiver }),
            Some(MessageKind::Project) => self
                .project_id
                .map(|project| Destination::Project { project }),
            Some(MessageKind::Workspace) => self
                .workspace_id
                .map(|workspace| Destination::Workspace { workspace }),
            None => None,
        };
        destination.ok_or_else(|| {
            sqlx::Error::Decode(
                format!("message {} has inconsistent destination ({})", self.id, self.kind).into(),
            )
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttachmentRow {
    filename: String,
    url: String,
    content_type: String,
    size: i64,
    uploader_id: Uuid,
    uploaded_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    reader_id: Uuid,
    read_at: DateTime<Utc>,
}

const MESSAGE_COLUMNS: &str =
    "id, kind, sender_id, receiver_id, project_id, workspace_id, content, created_at";

/// Persist a message with its attachments and initial read receipts
///
/// Runs in a single transaction so a message is never visible without its
/// attachments.
pub async fn insert_message(pool: &SqlitePool, message: &Message) -> Result<(), sqlx::Error> {
    let (receiver_id, project_id, workspace_id) = match message.destination {
        Destination::Personal { receiver } => (Some(receiver), None, None),
        Destination::Project { project } => (None, Some(project), None),
        Destination::Workspace { workspace } => (None, None, Some(workspace)),
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO messages (id, kind, sender_id, receiver_id, project_id, workspace_id, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.id)
    .bind(message.kind().as_str())
    .bind(message.sender)
    .bind(receiver_id)
    .bind(project_id)
    .bind(workspace_id)
    .bind(&message.content)
    .bind(message.created_at)
    .execute(&mut *tx)
    .await?;

    for (position, attachment) in message.attachments.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO message_attachments
                (message_id, position, filename, url, content_type, size, uploader_id, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id)
        .bind(position as i64)
        .bind(&attachment.filename)
        .bind(&attachment.url)
        .bind(&attachment.content_type)
        .bind(i64::try_from(attachment.size).map_err(|e| sqlx::Error::Encode(Box::new(e)))?)
        .bind(attachment.uploader)
        .bind(attachment.uploaded_at)
        .execute(&mut *tx)
        .await?;
    }

    for receipt in &message.read_by {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO message_read_receipts (message_id, reader_id, read_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(message.id)
        .bind(receipt.reader)
        .bind(receipt.read_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Load a single message by ID
pub async fn find_message(pool: &SqlitePool, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
    let row = sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT {} FROM messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(hydrate(pool, row).await?)),
        None => Ok(None),
    }
}

/// Append a read receipt
///
/// # Returns
/// `true` if the receipt was recorded, `false` if the reader already had one
pub async fn append_read_receipt(
    pool: &SqlitePool,
    message_id: Uuid,
    reader: Uuid,
    read_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO message_read_receipts (message_id, reader_id, read_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(message_id)
    .bind(reader)
    .bind(read_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Latest personal messages exchanged between two users, oldest first
pub async fn personal_history(
    pool: &SqlitePool,
    user_a: Uuid,
    user_b: Uuid,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        r#"
        SELECT {columns} FROM (
            SELECT seq, {columns}
            FROM messages
            WHERE kind = 'personal'
              AND ((sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?))
            ORDER BY seq DESC
            LIMIT ?
        )
        ORDER BY seq ASC
        "#,
        columns = MESSAGE_COLUMNS
    ))
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    hydrate_all(pool, rows).await
}

/// Latest messages posted to a workspace or project, oldest first
pub async fn group_history(
    pool: &SqlitePool,
    group: Group,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let (filter, group_id) = match group {
        Group::Workspace(id) => ("kind = 'workspace' AND workspace_id = ?", id),
        Group::Project(id) => ("kind = 'project' AND project_id = ?", id),
    };

    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        r#"
        SELECT {columns} FROM (
            SELECT seq, {columns}
            FROM messages
            WHERE {filter}
            ORDER BY seq DESC
            LIMIT ?
        )
        ORDER BY seq ASC
        "#,
        columns = MESSAGE_COLUMNS,
        filter = filter
    ))
    .bind(group_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    hydrate_all(pool, rows).await
}

async fn hydrate_all(pool: &SqlitePool, rows: Vec<MessageRow>) -> Result<Vec<Message>, sqlx::Error> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        messages.push(hydrate(pool, row).await?);
    }
    Ok(messages)
}

async fn hydrate(pool: &SqlitePool, row: MessageRow) -> Result<Message, sqlx::Error> {
    let destination = row.destination()?;

    let attachments = sqlx::query_as::<_, AttachmentRow>(
        r#"
        SELECT filename, url, content_type, size, uploader_id, uploaded_at
        FROM message_attachments
        WHERE message_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|a| {
        Ok(Attachment {
            filename: a.filename,
            url: a.url,
            content_type: a.content_type,
            size: u64::try_from(a.size).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            uploader: a.uploader_id,
            uploaded_at: a.uploaded_at,
        })
    })
    .collect::<Result<Vec<_>, sqlx::Error>>()?;

    let read_by = sqlx::query_as::<_, ReceiptRow>(
        r#"
        SELECT reader_id, read_at
        FROM message_read_receipts
        WHERE message_id = ?
        ORDER BY seq ASC
        "#,
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| ReadReceipt {
        reader: r.reader_id,
        read_at: r.read_at,
    })
    .collect();

    Ok(Message {
        id: row.id,
        sender: row.sender_id,
        destination,
        content: row.content,
        attachments,
        read_by,
        created_at: row.created_at,
    })
}
