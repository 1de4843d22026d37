/**
 * Error Conversion
 *
 * `IntoResponse` for backend errors. Only the socket handshake and the
 * health probe return HTTP responses, so in practice this renders the 401
 * that rejects an unauthenticated upgrade.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Authentication error: missing credential",
 *   "status": 401
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::error::types::{AuthError, BackendError};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let BackendError::Persistence(err) = &self {
            tracing::error!("[Server] Storage failure: {:?}", err);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        BackendError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_auth_error_renders_401() {
        let response = AuthError::InvalidCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_not_found_renders_404() {
        let response = BackendError::not_found("Message").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
