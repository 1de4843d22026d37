//! Shared Module
//!
//! Types that cross the socket boundary. Everything here is plain serde data
//! so clients and tests can build and decode frames without the server
//! runtime.

/// Message data structure
pub mod message;

/// Socket event protocol
pub mod event;

/// Task snapshot
pub mod task;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use message::{Attachment, Destination, Message, MessageKind, ReadReceipt};
pub use event::{Ack, ClientEvent, ClientFrame, ServerEvent};
pub use task::Task;
pub use error::SharedError;
