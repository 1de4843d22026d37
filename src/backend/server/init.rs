/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Connect the database and run migrations
 * 2. Build `AppState` around the pool and JWT keys
 * 3. Create the router
 * 4. Start the periodic stale-connection sweep
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::backend::realtime::RoomHub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails if the database cannot be opened or migrated.
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing TeamHub realtime server");

    let db_pool = load_database(config).await?;
    let app_state = AppState::new(db_pool, config.jwt_keys())
        .with_outbound_buffer(config.outbound_buffer);

    let app = create_router(app_state.clone());

    spawn_cleanup_task(app_state.hub.clone(), config.cleanup_interval);
    tracing::info!("Router configured with periodic cleanup task");

    Ok(app)
}

/// Periodically drop connections whose socket task has ended
pub fn spawn_cleanup_task(hub: Arc<RoomHub>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = hub.cleanup_inactive_rooms().await;
            if removed > 0 {
                tracing::info!("[Realtime] Cleaned up {} stale connections", removed);
            } else {
                tracing::debug!("[Realtime] No stale connections to clean up");
            }
        }
    })
}
