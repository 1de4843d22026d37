/**
 * Database Operations for Workspaces and Projects
 *
 * Workspaces and projects are managed by the REST layer. This module holds
 * the membership queries the realtime core depends on, plus the inserts
 * used for seeding.
 */

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::store::Group;
use crate::shared::message::timestamp_now;

/// Create a workspace and return its ID
pub async fn create_workspace(pool: &SqlitePool, name: &str) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO workspaces (id, name, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(timestamp_now())
    .execute(pool)
    .await?;
    Ok(id)
}

/// Create a project inside a workspace and return its ID
pub async fn create_project(
    pool: &SqlitePool,
    workspace_id: Uuid,
    name: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO projects (id, workspace_id, name, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(workspace_id)
    .bind(name)
    .bind(timestamp_now())
    .execute(pool)
    .await?;
    Ok(id)
}

/// Add a user to a workspace or project. Re-adding is a no-op.
pub async fn add_member(
    pool: &SqlitePool,
    group: Group,
    user_id: Uuid,
    role: &str,
) -> Result<(), sqlx::Error> {
    let (sql, group_id) = match group {
        Group::Workspace(id) => (
            r#"
            INSERT OR IGNORE INTO workspace_members (workspace_id, user_id, role)
            VALUES (?, ?, ?)
            "#,
            id,
        ),
        Group::Project(id) => (
            r#"
            INSERT OR IGNORE INTO project_members (project_id, user_id, role)
            VALUES (?, ?, ?)
            "#,
            id,
        ),
    };

    sqlx::query(sql)
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a user from a workspace or project
///
/// # Returns
/// `true` if the user was a member
pub async fn remove_member(
    pool: &SqlitePool,
    group: Group,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (sql, group_id) = match group {
        Group::Workspace(id) => (
            "DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
            id,
        ),
        Group::Project(id) => (
            "DELETE FROM project_members WHERE project_id = ? AND user_id = ?",
            id,
        ),
    };

    let result = sqlx::query(sql)
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Every workspace and project a user belongs to, workspaces first
pub async fn groups_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Group>, sqlx::Error> {
    let workspaces: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT workspace_id
        FROM workspace_members
        WHERE user_id = ?
        ORDER BY rowid ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let projects: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT project_id
        FROM project_members
        WHERE user_id = ?
        ORDER BY rowid ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(workspaces
        .into_iter()
        .map(Group::Workspace)
        .chain(projects.into_iter().map(Group::Project))
        .collect())
}

/// Live membership check
pub async fn is_member(pool: &SqlitePool, user_id: Uuid, group: Group) -> Result<bool, sqlx::Error> {
    let (sql, group_id) = match group {
        Group::Workspace(id) => (
            "SELECT 1 FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
            id,
        ),
        Group::Project(id) => (
            "SELECT 1 FROM project_members WHERE project_id = ? AND user_id = ?",
            id,
        ),
    };

    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
