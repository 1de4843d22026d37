//! Backend Error Module
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - AuthError and BackendError
//! └── conversion.rs - IntoResponse implementations
//! ```
//!
//! # Error Types
//!
//! - `AuthError` - Handshake rejection reasons
//! - `BackendError::Unauthenticated` - Wraps `AuthError`
//! - `BackendError::NotAuthorized` - Sender is not a live group member
//! - `BackendError::NotFound` - Referenced entity is missing
//! - `BackendError::Persistence` - Storage failures
//! - `BackendError::Validation` - Payload decoding and validation errors
//! - `BackendError::Serialization` - JSON encoding errors

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{AuthError, BackendError};
