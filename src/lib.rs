//! TeamHub - Realtime Collaboration Core
//!
//! TeamHub is the realtime layer of a multi-tenant workspace/project/task
//! backend. It authenticates persistent socket connections, routes them into
//! rooms derived from workspace and project membership, and fans out chat,
//! typing, presence and task-update events.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared by the server and its clients
//!   - Messages, attachments and read receipts
//!   - Socket event protocol (`ClientEvent`, `ServerEvent`)
//!   - Error types
//!
//! - **`backend`** - Server-side code
//!   - Axum server with the `/socket` upgrade and `/health` probe
//!   - Presence registry and room hub
//!   - Message pipeline and task event relay
//!   - SQLite persistence behind collaborator traits
//!
//! # Usage
//!
//! ```rust,no_run
//! use teamhub::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All server state is shared through `Arc` handles held by `AppState`.
//! Cross-connection coordination happens only through the presence registry
//! and the room hub, each guarded by a single `tokio::sync::RwLock`.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
