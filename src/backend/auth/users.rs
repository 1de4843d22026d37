/**
 * User Model and Database Operations
 *
 * Users are owned by the external account service. The realtime core only
 * needs to know whether an identity still exists; `create_user` is kept for
 * seeding and tests.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::message::timestamp_now;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username
    pub username: String,
    /// User email address
    pub email: String,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// Create a new user
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        created_at: timestamp_now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(user)
}

/// Whether a user row exists
pub async fn user_exists(pool: &SqlitePool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
