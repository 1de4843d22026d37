//! Server Module
//!
//! Configuration, application state and startup.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs     - Module exports and documentation
//! ├── state.rs   - Application state and FromRef impls
//! ├── config.rs  - Environment configuration and database loading
//! └── init.rs    - Router creation and background tasks
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use init::create_app;
pub use state::AppState;
