//! Ory Kratos HTTP client
//!
//! Sessions are validated against the public API (`/sessions/whoami`) and
//! identities are read from the admin API (`/admin/identities/{id}`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::COOKIE, StatusCode};
use tracing::debug;
use url::Url;

use crate::{AuthError, AuthResult, Identity, IdentityProvider, Session, SESSION_COOKIE_NAME};

/// Kratos endpoint configuration
#[derive(Debug, Clone)]
pub struct KratosConfig {
    /// Public API base URL (e.g., "http://localhost:4433")
    pub public_url: String,

    /// Admin API base URL (e.g., "http://localhost:4434")
    pub admin_url: String,

    /// Timeout applied to every request
    pub timeout: Duration,
}

impl KratosConfig {
    /// Create a new Kratos configuration with a 10 second timeout
    pub fn new(public_url: impl Into<String>, admin_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
            admin_url: admin_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Kratos client.
///
/// Holds one `reqwest::Client`, so connections are pooled and the client can
/// be shared across requests.
#[derive(Debug, Clone)]
pub struct KratosClient {
    http: reqwest::Client,
    whoami_url: Url,
    admin_url: Url,
}

impl KratosClient {
    /// Create a new client
    pub fn new(config: KratosConfig) -> AuthResult<Self> {
        let public_url = parse_base_url(&config.public_url)?;
        let admin_url = parse_base_url(&config.admin_url)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            whoami_url: join_segments(&public_url, &["sessions", "whoami"]),
            admin_url,
        })
    }

    /// URL of the session validation endpoint
    pub fn whoami_url(&self) -> &Url {
        &self.whoami_url
    }

    /// URL of an identity in the admin API
    pub fn identity_url(&self, id: &str) -> Url {
        join_segments(&self.admin_url, &["admin", "identities", id])
    }
}

fn parse_base_url(raw: &str) -> AuthResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AuthError::Configuration(format!("Invalid URL {raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AuthError::Configuration(format!(
            "URL cannot be used as a base: {raw}"
        )));
    }
    Ok(url)
}

/// Appends percent-encoded path segments to a base URL.
fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Returns true if `token` can be sent as a cookie value without adding
/// other cookies or attributes to the header.
fn is_cookie_safe(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b';' | b',' | b'"' | b'\\'))
}

#[async_trait]
impl IdentityProvider for KratosClient {
    async fn validate_session(&self, token: &str) -> AuthResult<Session> {
        if !is_cookie_safe(token) {
            debug!("Session token is not a valid cookie value");
            return Err(AuthError::Unauthorized);
        }

        let response = self
            .http
            .get(self.whoami_url.clone())
            .header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "Session rejected by Kratos");
            return Err(AuthError::Unauthorized);
        }

        let session: Session = response.json().await?;
        if !session.active {
            debug!(session_id = %session.id, "Session is inactive");
            return Err(AuthError::Unauthorized);
        }

        Ok(session)
    }

    async fn get_identity(&self, id: &str) -> AuthResult<Identity> {
        let response = self.http.get(self.identity_url(id)).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(AuthError::NotFound(id.to_string())),
            status => Err(AuthError::UnexpectedStatus(status.as_u16())),
        }
    }
}
