/**
 * Identity Verifier
 *
 * Validates the bearer credential presented on the socket handshake and
 * resolves it to a user identity. Verification is stateless: no session or
 * cookie is created, and the result lives only as long as the connection.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::auth::sessions::{verify_token, JwtKeys};
use crate::backend::error::{AuthError, BackendError};
use crate::backend::store::UserStore;

/// Authenticated user behind a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Clone)]
pub struct IdentityVerifier {
    keys: JwtKeys,
    users: Arc<dyn UserStore>,
}

impl IdentityVerifier {
    pub fn new(keys: JwtKeys, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }

    /// Resolve a handshake credential to an identity
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredential` - no token, or a blank one
    /// * `AuthError::InvalidCredential` - bad signature, expired, malformed,
    ///   or a subject that is not a UUID
    /// * `AuthError::IdentityNotFound` - the user was deleted
    /// * `BackendError::Persistence` - the user lookup failed
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Identity, BackendError> {
        let token = credential
            .map(str::trim)
            .map(|t| t.strip_prefix("Bearer ").unwrap_or(t).trim())
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let claims = verify_token(token, &self.keys).map_err(|e| {
            tracing::debug!("[Auth] Token verification failed: {}", e);
            AuthError::InvalidCredential
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidCredential)?;

        if !self.users.exists(user_id).await? {
            tracing::warn!("[Auth] Token subject {} no longer exists", user_id);
            return Err(AuthError::IdentityNotFound.into());
        }

        Ok(Identity {
            user_id,
            email: claims.email,
        })
    }
}
