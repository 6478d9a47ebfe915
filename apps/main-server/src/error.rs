//! Server error types.

use async_graphql::ErrorExtensions;
use auth::AuthError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use profile_store::ProfileStoreError;
use serde_json::json;

use crate::services::ServiceError;

/// Error codes reported in HTTP bodies and GraphQL error extensions.
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const UPSTREAM_FAILURE: &str = "UPSTREAM_FAILURE";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No authenticated principal for an operation that needs one.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Missing, malformed, invalid or expired session credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// The identity provider failed or answered with an unexpected shape.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns the status code and error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, error_codes::CONFLICT),
            ServerError::AuthenticationRequired => {
                (StatusCode::UNAUTHORIZED, error_codes::UNAUTHENTICATED)
            }
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, error_codes::UNAUTHORIZED),
            ServerError::Upstream(_) => (StatusCode::BAD_GATEWAY, error_codes::UPSTREAM_FAILURE),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL)
            }
        }
    }
}

impl From<ProfileStoreError> for ServerError {
    fn from(e: ProfileStoreError) -> Self {
        match e {
            ProfileStoreError::NotFound { .. } => ServerError::NotFound(e.to_string()),
            ProfileStoreError::AlreadyExists { .. } => ServerError::Conflict(e.to_string()),
            other => {
                tracing::error!(error = %other, "Profile store failure");
                ServerError::Internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => ServerError::Unauthorized,
            AuthError::NotAuthenticated => ServerError::AuthenticationRequired,
            AuthError::Configuration(msg) => ServerError::Internal(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<ServiceError> for ServerError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Store(e) => e.into(),
            ServiceError::Provisioning { .. } => {
                tracing::warn!(error = %e, "User provisioning failed");
                ServerError::Upstream(e.to_string())
            }
            ServiceError::Session(_) => ServerError::Unauthorized,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl ErrorExtensions for ServerError {
    fn extend(&self) -> async_graphql::Error {
        let (_, code) = self.status_and_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_codes() {
        let not_found: ServerError = ProfileStoreError::not_found("User", "x").into();
        assert_eq!(not_found.status_and_code().1, error_codes::NOT_FOUND);

        let conflict: ServerError = ProfileStoreError::already_exists("User", "x").into();
        assert_eq!(conflict.status_and_code(), (StatusCode::CONFLICT, error_codes::CONFLICT));
    }

    #[test]
    fn test_auth_errors_map_to_codes() {
        let err: ServerError = AuthError::NotAuthenticated.into();
        assert!(matches!(err, ServerError::AuthenticationRequired));

        let err: ServerError = AuthError::MissingTrait("email").into();
        assert_eq!(err.status_and_code().1, error_codes::UPSTREAM_FAILURE);
    }

    #[test]
    fn test_unauthorized_hides_cause() {
        let err: ServerError = ServiceError::Session(AuthError::Unauthorized).into();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_graphql_extension_code() {
        let err = ServerError::Conflict("User already exists: x".to_string()).extend();
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from(error_codes::CONFLICT)));
    }
}
