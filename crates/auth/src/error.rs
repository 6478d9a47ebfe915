//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during identity provider operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session credential is missing, invalid or expired.
    #[error("Invalid or expired session")]
    Unauthorized,

    /// No authenticated principal is attached to the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Identity not found.
    #[error("Identity not found: {0}")]
    NotFound(String),

    /// The provider answered with an unexpected status code.
    #[error("Unexpected status from identity provider: {0}")]
    UnexpectedStatus(u16),

    /// A required identity trait is missing or has the wrong type.
    #[error("{0} not found in traits")]
    MissingTrait(&'static str),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
