//! Chat Module
//!
//! Persistence and delivery of personal, project and workspace messages,
//! plus the typing indicator relay.
//!
//! # Module Structure
//!
//! ```text
//! chat/
//! ├── mod.rs       - Module exports and documentation
//! ├── db.rs        - Message, attachment and read-receipt queries
//! ├── pipeline.rs  - Validate, authorize, persist, broadcast
//! └── typing.rs    - Typing indicator relay
//! ```

/// Database operations for messages
pub mod db;

/// Send and read-receipt pipeline
pub mod pipeline;

/// Typing indicator relay
pub mod typing;

// Re-export commonly used types
pub use pipeline::MessagePipeline;
pub use typing::relay_typing;
