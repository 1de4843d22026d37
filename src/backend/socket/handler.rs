/**
 * Socket Upgrade Handler
 *
 * `GET /socket?token=<jwt>` authenticates before upgrading. A rejected
 * credential answers with a 401 JSON body and no connection is registered,
 * joined or announced.
 */

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::backend::socket::session::run_session;

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn socket_handler(
    State(app_state): State<AppState>,
    Query(params): Query<SocketParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, BackendError> {
    let identity = app_state
        .verifier
        .authenticate(params.token.as_deref())
        .await
        .map_err(|e| {
            tracing::info!("[Socket] Rejected handshake: {}", e);
            e
        })?;

    tracing::info!("[Socket] Upgrading connection for user {}", identity.user_id);
    Ok(ws.on_upgrade(move |socket| run_session(socket, identity, app_state)))
}
