//! Workspace and project membership storage.

/// Membership queries and seeding inserts
pub mod db;
