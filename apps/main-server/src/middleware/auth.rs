//! Session middleware.
//!
//! Resolves the principal behind each request from the Kratos session cookie
//! or a bearer token. Requests without any credential pass through
//! anonymously; each operation decides whether it needs a principal.

use std::convert::Infallible;
use std::sync::Arc;

use auth::{AuthError, SESSION_COOKIE_NAME, Session};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::error::ServerError;
use crate::state::AppState;

/// Paths that bypass session resolution entirely.
pub const EXEMPT_PATHS: &[&str] = &["/health", "/playground"];

/// The authenticated identity behind a request.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Identity ID (also the local user ID).
    pub id: String,
    /// The validated session.
    pub session: Session,
}

impl From<Session> for Principal {
    fn from(session: Session) -> Self {
        Self {
            id: session.identity.id.clone(),
            session,
        }
    }
}

/// Per-request context handed to every operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    /// Context for a request without a principal.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated request.
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    /// Returns the principal ID, if any.
    pub fn principal_id(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.id.as_str())
    }

    /// Returns the full principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the principal ID or fails with `NotAuthenticated` when it is
    /// absent or empty.
    pub fn require_authenticated(&self) -> Result<&str, AuthError> {
        self.principal_id()
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::NotAuthenticated)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extracts the session credential.
///
/// The session cookie wins over the `Authorization` header. Returns
/// `Ok(None)` when neither is present, and fails when the header is not
/// exactly `Bearer <token>`.
fn extract_credential(headers: &HeaderMap) -> Result<Option<String>, ServerError> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        return Ok(Some(cookie.value().to_string()));
    }

    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| ServerError::Unauthorized)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(Some(token.to_string())),
        _ => Err(ServerError::Unauthorized),
    }
}

/// Session middleware.
///
/// Inserts a [`RequestContext`] into the request extensions for every
/// non-exempt request. Credential failures answer 401 without detail.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let credential = match extract_credential(request.headers()) {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            request.extensions_mut().insert(RequestContext::anonymous());
            return next.run(request).await;
        }
        Err(err) => {
            debug!("Malformed authorization header");
            return err.into_response();
        }
    };

    match state.profiles.get_user_session(&credential).await {
        Ok(session) => {
            let principal = Principal::from(session);
            debug!(user_id = %principal.id, "Authenticated request");
            request
                .extensions_mut()
                .insert(RequestContext::authenticated(principal));
            next.run(request).await
        }
        Err(err) => {
            debug!(error = %err, "Session validation failed");
            ServerError::Unauthorized.into_response()
        }
    }
}
