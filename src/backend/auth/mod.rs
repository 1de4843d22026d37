//! Authentication Module
//!
//! Socket handshakes carry a JWT in the `token` query parameter. The
//! `IdentityVerifier` checks it and confirms the user still exists before
//! any room join or presence registration happens.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports and documentation
//! ├── users.rs     - User model and database operations
//! ├── sessions.rs  - JWT token management
//! └── verifier.rs  - Handshake credential verification
//! ```

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// Handshake credential verification
pub mod verifier;

// Re-export commonly used types
pub use sessions::{create_token, verify_token, Claims, JwtKeys};
pub use verifier::{Identity, IdentityVerifier};
