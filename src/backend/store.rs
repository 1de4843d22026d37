//! Collaborator Traits
//!
//! The realtime core talks to persistence only through these traits, so the
//! presence, room and pipeline components can be driven by any backing store.
//! `SqliteStore` is the production implementation; every method delegates to
//! the query functions in the owning module's `db.rs`.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::{Message, Task};

/// A workspace or project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Workspace(Uuid),
    Project(Uuid),
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Workspace(id) => write!(f, "workspace {}", id),
            Group::Project(id) => write!(f, "project {}", id),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists(&self, user_id: Uuid) -> Result<bool, sqlx::Error>;
}

/// Group membership lookups
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Every workspace and project the user belongs to
    async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<Group>, sqlx::Error>;

    /// Live membership check, evaluated at the point of use
    async fn is_member(&self, user_id: Uuid, group: Group) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, message: &Message) -> Result<(), sqlx::Error>;

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error>;

    /// Returns `false` if the reader already had a receipt
    async fn append_read_receipt(
        &self,
        message_id: Uuid,
        reader: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>;

    /// Latest personal messages between two users, oldest first
    async fn personal_history(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error>;

    /// Latest messages posted to a group, oldest first
    async fn group_history(&self, group: Group, limit: i64) -> Result<Vec<Message>, sqlx::Error>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error>;
}

/// SQLite-backed implementation of every collaborator trait
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn exists(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        crate::backend::auth::users::user_exists(&self.pool, user_id).await
    }
}

#[async_trait]
impl MembershipResolver for SqliteStore {
    async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<Group>, sqlx::Error> {
        crate::backend::groups::db::groups_for_user(&self.pool, user_id).await
    }

    async fn is_member(&self, user_id: Uuid, group: Group) -> Result<bool, sqlx::Error> {
        crate::backend::groups::db::is_member(&self.pool, user_id, group).await
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn create(&self, message: &Message) -> Result<(), sqlx::Error> {
        crate::backend::chat::db::insert_message(&self.pool, message).await
    }

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
        crate::backend::chat::db::find_message(&self.pool, message_id).await
    }

    async fn append_read_receipt(
        &self,
        message_id: Uuid,
        reader: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        crate::backend::chat::db::append_read_receipt(&self.pool, message_id, reader, read_at).await
    }

    async fn personal_history(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        crate::backend::chat::db::personal_history(&self.pool, user_a, user_b, limit).await
    }

    async fn group_history(&self, group: Group, limit: i64) -> Result<Vec<Message>, sqlx::Error> {
        crate::backend::chat::db::group_history(&self.pool, group, limit).await
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        crate::backend::tasks::db::find_task(&self.pool, task_id).await
    }
}
