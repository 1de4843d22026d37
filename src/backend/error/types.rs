/**
 * Backend Error Types
 *
 * Errors raised while authenticating connections and handling socket events.
 * Handshake failures become HTTP responses; per-event failures become a
 * failed `ack` (or `taskError`) sent to the originating connection only.
 *
 * # Error Categories
 *
 * ## Authentication Errors
 *
 * `AuthError` is fatal to the connection and rejects the upgrade with 401:
 * - Missing credential
 * - Malformed, expired or badly signed credential
 * - Credential for a user that no longer exists
 *
 * ## Event Errors
 *
 * `BackendError` covers everything that can go wrong after the connection
 * is established:
 * - Sender is not a live member of the target group
 * - Referenced task, message or user does not exist
 * - Storage failure
 * - Payload validation failure
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Reasons a connection handshake is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token in the handshake
    #[error("Authentication error: missing credential")]
    MissingCredential,

    /// Token could not be verified
    #[error("Authentication error: invalid credential")]
    InvalidCredential,

    /// Token is valid but its subject no longer resolves to a user
    #[error("Authentication error: identity not found")]
    IdentityNotFound,
}

/// Backend-specific error types
///
/// Each variant maps to an HTTP status code and a client-facing message.
///
/// # Usage
///
/// ```rust
/// use teamhub::backend::error::BackendError;
///
/// let err = BackendError::not_found("Task");
/// assert_eq!(err.message(), "Task not found");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handshake credential was rejected
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// Sender is not a live member of the destination group
    #[error("Not authorized")]
    NotAuthorized,

    /// A referenced entity does not exist
    #[error("{resource} not found")]
    NotFound {
        /// Kind of entity that was looked up
        resource: String,
    },

    /// Storage failure
    ///
    /// The underlying error is logged; clients only see a generic message.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Payload failed decoding or validation
    #[error(transparent)]
    Validation(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new not-found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthenticated` - 401 Unauthorized
    /// - `NotAuthorized` - 403 Forbidden
    /// - `NotFound` - 404 Not Found
    /// - `Persistence` - 500 Internal Server Error
    /// - `Validation` - 400 Bad Request
    /// - `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the client-facing error message
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated(err) => err.to_string(),
            Self::NotAuthorized => "Not authorized".to_string(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Persistence(_) => "Storage unavailable".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Serialization(_) => "Failed to encode response".to_string(),
        }
    }
}
