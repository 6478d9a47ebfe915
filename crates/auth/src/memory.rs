//! In-memory identity provider (for testing and local runs)

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AuthError, AuthResult, Identity, IdentityProvider, Session};

/// In-memory identity provider.
///
/// Sessions are keyed by token. Every call is counted so tests can assert
/// whether the provider was consulted.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    sessions: RwLock<HashMap<String, Session>>,
    identities: RwLock<HashMap<String, Identity>>,
    calls: AtomicUsize,
}

impl MemoryIdentityProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity
    pub async fn add_identity(&self, identity: Identity) {
        self.identities
            .write()
            .await
            .insert(identity.id.clone(), identity);
    }

    /// Register an identity and an active session for it under `token`
    pub async fn add_session(&self, token: impl Into<String>, identity: Identity) {
        let token = token.into();
        let session = Session::new(format!("session-{token}"), identity.clone());
        self.add_identity(identity).await;
        self.sessions.write().await.insert(token, session);
    }

    /// Number of calls made to the provider so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn validate_session(&self, token: &str) -> AuthResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .read()
            .await
            .get(token)
            .filter(|session| session.active)
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }

    async fn get_identity(&self, id: &str) -> AuthResult<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.identities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }
}
