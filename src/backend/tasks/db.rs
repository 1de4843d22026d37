/**
 * Database Operations for Tasks
 *
 * Tasks are created and edited through the REST layer; the relay reads a
 * task with its ordered assignee list to route update notifications.
 */

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::message::timestamp_now;
use crate::shared::Task;

/// Create a task with its initial assignees
pub async fn create_task(
    pool: &SqlitePool,
    project_id: Uuid,
    title: &str,
    assignees: &[Uuid],
) -> Result<Task, sqlx::Error> {
    let task = Task {
        id: Uuid::new_v4(),
        project_id,
        title: title.to_string(),
        status: "todo".to_string(),
        assignees: Vec::new(),
        updated_at: timestamp_now(),
    };

    sqlx::query(
        r#"
        INSERT INTO tasks (id, project_id, title, status, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.id)
    .bind(task.project_id)
    .bind(&task.title)
    .bind(&task.status)
    .bind(task.updated_at)
    .execute(pool)
    .await?;

    set_assignees(pool, task.id, assignees).await?;

    Ok(Task {
        assignees: assignees.to_vec(),
        ..task
    })
}

/// Replace a task's assignee list, preserving the given order
pub async fn set_assignees(
    pool: &SqlitePool,
    task_id: Uuid,
    assignees: &[Uuid],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    for (position, user_id) in assignees.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO task_assignees (task_id, user_id, position)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE tasks SET updated_at = ? WHERE id = ?")
        .bind(timestamp_now())
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Load a task and its assignees
pub async fn find_task(pool: &SqlitePool, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct TaskRow {
        id: Uuid,
        project_id: Uuid,
        title: String,
        status: String,
        updated_at: DateTime<Utc>,
    }

    let Some(row) = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, project_id, title, status, updated_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let assignees: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT user_id
        FROM task_assignees
        WHERE task_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(Task {
        id: row.id,
        project_id: row.project_id,
        title: row.title,
        status: row.status,
        assignees,
        updated_at: row.updated_at,
    }))
}
