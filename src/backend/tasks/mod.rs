//! Task Module
//!
//! Task lookups and the relay that notifies assignees of task changes.

/// Database operations for tasks
pub mod db;

/// Assignee notification relay
pub mod relay;

pub use relay::TaskEventRelay;
