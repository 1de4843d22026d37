/**
 * Router Configuration
 *
 * # Routes
 *
 * - `GET /socket?token=<jwt>` - WebSocket upgrade for the realtime protocol
 * - `GET /health` - liveness probe with connection counts
 *
 * Everything else answers 404. REST resources live in a separate service.
 */

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::server::state::AppState;
use crate::backend::socket::socket_handler;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/socket", get(socket_handler))
        .route("/health", get(health))
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Liveness probe
async fn health(State(app_state): State<AppState>) -> Json<Value> {
    let connections = app_state.hub.connection_count().await;
    let online_users = app_state.presence.online_users().await.len();
    Json(json!({
        "status": "ok",
        "connections": connections,
        "onlineUsers": online_users,
    }))
}
