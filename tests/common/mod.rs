//! Common test utilities and helpers
//!
//! - Database fixtures and seeding
//! - Token helpers
//! - A real server on a local port with a socket client
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod database;
pub mod server;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use database::*;
pub use server::*;
