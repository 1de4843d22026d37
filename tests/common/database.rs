//! Database test fixtures and seeding helpers
//!
//! Every fixture is a fresh in-memory SQLite database with migrations
//! applied. The pool holds a single connection so all queries see the same
//! database.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use teamhub::backend::auth::users::{create_user, User};
use teamhub::backend::groups::db::{add_member, create_project, create_workspace};
use teamhub::backend::store::Group;
use uuid::Uuid;

/// Create a migrated in-memory database pool
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Create a user with a unique email
pub async fn seed_user(pool: &SqlitePool, username: &str) -> User {
    let email = format!("{}_{}@example.com", username, Uuid::new_v4().simple());
    create_user(pool, username, &email)
        .await
        .expect("Failed to create test user")
}

/// A workspace containing one project
pub struct SeededGroups {
    pub workspace: Uuid,
    pub project: Uuid,
}

pub async fn seed_workspace_with_project(pool: &SqlitePool) -> SeededGroups {
    let workspace = create_workspace(pool, "Acme")
        .await
        .expect("Failed to create workspace");
    let project = create_project(pool, workspace, "Launch")
        .await
        .expect("Failed to create project");
    SeededGroups { workspace, project }
}

pub async fn join_group(pool: &SqlitePool, group: Group, user_id: Uuid) {
    add_member(pool, group, user_id, "member")
        .await
        .expect("Failed to add member");
}

/// Delete a user row, as the account service would
pub async fn remove_user(pool: &SqlitePool, user_id: Uuid) {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to delete user");
}
