/**
 * Application State Management
 *
 * `AppState` is built once at startup and cloned into every handler and
 * connection task. Every component is injected here; there is no global
 * state.
 *
 * # Architecture
 *
 * - `hub` - live connections and room index
 * - `presence` - online/offline registry, broadcasting through `hub`
 * - `rooms` - connect-time room joins from group membership
 * - `pipeline` - message send and read-receipt handling
 * - `relay` - task update notifications
 * - `verifier` - handshake authentication
 *
 * All collaborators share one `SqliteStore`.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract just the piece of
 * state they need.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::{IdentityVerifier, JwtKeys};
use crate::backend::chat::MessagePipeline;
use crate::backend::realtime::{PresenceRegistry, RoomHub, RoomManager};
use crate::backend::server::config::DEFAULT_OUTBOUND_BUFFER;
use crate::backend::store::SqliteStore;
use crate::backend::tasks::TaskEventRelay;

#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db_pool: SqlitePool,
    /// Live connections and their rooms
    pub hub: Arc<RoomHub>,
    /// Online/offline tracking
    pub presence: Arc<PresenceRegistry>,
    /// Connect-time room joins
    pub rooms: RoomManager,
    /// Message send and read-receipt pipeline
    pub pipeline: MessagePipeline,
    /// Task update relay
    pub relay: TaskEventRelay,
    /// Handshake credential verification
    pub verifier: IdentityVerifier,
    /// Per-connection outbound queue length
    pub outbound_buffer: usize,
}

impl AppState {
    /// Wire every component around one SQLite pool
    pub fn new(db_pool: SqlitePool, keys: JwtKeys) -> Self {
        let store = Arc::new(SqliteStore::new(db_pool.clone()));
        let hub = Arc::new(RoomHub::new());

        Self {
            db_pool,
            presence: Arc::new(PresenceRegistry::new(hub.clone())),
            rooms: RoomManager::new(hub.clone(), store.clone()),
            pipeline: MessagePipeline::new(hub.clone(), store.clone(), store.clone(), store.clone()),
            relay: TaskEventRelay::new(hub.clone(), store.clone()),
            verifier: IdentityVerifier::new(keys, store),
            hub,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(1);
        self
    }
}

impl FromRef<AppState> for Arc<RoomHub> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
