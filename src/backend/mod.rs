//! Backend Module
//!
//! Server-side code for the TeamHub realtime core.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, startup
//! - **`routes`** - Router assembly
//! - **`socket`** - Handshake and per-connection event loop
//! - **`auth`** - JWT tokens and identity verification
//! - **`realtime`** - Connection hub, rooms, presence
//! - **`chat`** - Message pipeline, typing relay, message storage
//! - **`tasks`** - Task lookups and the assignee relay
//! - **`groups`** - Workspace and project membership storage
//! - **`store`** - Collaborator traits and the SQLite implementation
//! - **`error`** - Backend error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── main.rs     - Server binary
//! ├── store.rs    - Collaborator traits
//! ├── server/     - Server initialization and state
//! ├── routes/     - Route configuration
//! ├── socket/     - WebSocket handshake and session
//! ├── auth/       - Authentication
//! ├── realtime/   - Connection hub, rooms, presence
//! ├── chat/       - Messages and typing
//! ├── tasks/      - Task relay
//! ├── groups/     - Membership storage
//! └── error/      - Error types
//! ```
//!
//! # Event Flow
//!
//! connect -> authenticate -> resolve groups -> join rooms -> announce online
//! -> handle events (authorize against live membership, persist, fan out)
//! -> disconnect -> announce offline

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// WebSocket handshake and session loop
pub mod socket;

/// Authentication and identity verification
pub mod auth;

/// Connection hub, rooms and presence
pub mod realtime;

/// Chat message pipeline
pub mod chat;

/// Task event relay
pub mod tasks;

/// Workspace and project membership
pub mod groups;

/// Collaborator traits and SQLite store
pub mod store;

/// Backend error types
pub mod error;

// Re-export commonly used types
pub use error::{AuthError, BackendError};
pub use server::{create_app, AppState};
