//! Real-time Module
//!
//! Connection registry, room routing and presence tracking for socket
//! clients.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs         - Module exports and documentation
//! ├── connection.rs  - Per-connection outbound handle
//! ├── broadcast.rs   - Room hub and fan-out
//! ├── rooms.rs       - Room names and connect-time room joins
//! └── presence.rs    - Online/offline tracking
//! ```
//!
//! # Routing
//!
//! Every connection joins `user:<id>` plus one room per workspace and
//! project the user belongs to. Rooms decide who receives a broadcast; they
//! never decide who may send one.

/// Per-connection outbound handle
pub mod connection;

/// Room hub and fan-out
pub mod broadcast;

/// Room names and connect-time joins
pub mod rooms;

/// Online/offline tracking
pub mod presence;

// Re-export commonly used types
pub use broadcast::RoomHub;
pub use connection::{ConnectionHandle, ConnectionId};
pub use presence::PresenceRegistry;
pub use rooms::{Room, RoomManager};
