//! Socket Module
//!
//! The `/socket` endpoint: handshake authentication and the per-connection
//! event loop.

/// Upgrade handler
pub mod handler;

/// Per-connection event loop
pub mod session;

pub use handler::socket_handler;
