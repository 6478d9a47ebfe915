//! Identity and session types, and the provider trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AuthError, AuthResult, EMAIL_TRAIT};

/// An identity as stored by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identity ID, used as the local user ID.
    pub id: String,

    /// Schema-defined traits (email, name, ...).
    #[serde(default)]
    pub traits: Map<String, Value>,
}

impl Identity {
    /// Creates an identity with no traits
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            traits: Map::new(),
        }
    }

    /// Sets a trait
    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.traits.insert(key.into(), value.into());
        self
    }

    /// Returns the `email` trait.
    ///
    /// Fails if the trait is missing or not a string.
    pub fn email(&self) -> AuthResult<&str> {
        self.traits
            .get(EMAIL_TRAIT)
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingTrait(EMAIL_TRAIT))
    }
}

/// A validated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: String,

    /// Whether the session is still active
    #[serde(default = "default_active")]
    pub active: bool,

    /// When the session expires
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    /// The identity owning the session
    pub identity: Identity,
}

fn default_active() -> bool {
    true
}

impl Session {
    /// Creates an active session for an identity
    pub fn new(id: impl Into<String>, identity: Identity) -> Self {
        Self {
            id: id.into(),
            active: true,
            expires_at: None,
            identity,
        }
    }
}

/// Operations offered by the external identity provider.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validates a session token and returns the session.
    async fn validate_session(&self, token: &str) -> AuthResult<Session>;

    /// Fetches an identity by ID.
    async fn get_identity(&self, id: &str) -> AuthResult<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_email() {
        let identity = Identity::new("id-1").with_trait("email", "ann@x.com");
        assert_eq!(identity.email().unwrap(), "ann@x.com");
    }

    #[test]
    fn test_identity_email_missing_or_wrong_type() {
        let missing = Identity::new("id-1");
        assert!(matches!(missing.email(), Err(AuthError::MissingTrait("email"))));

        let numeric = Identity::new("id-1").with_trait("email", 42);
        assert!(matches!(numeric.email(), Err(AuthError::MissingTrait("email"))));
    }

    #[test]
    fn test_session_deserializes_kratos_payload() {
        let json = r#"{
            "id": "sess-1",
            "active": true,
            "expires_at": "2030-01-01T00:00:00Z",
            "authenticated_at": "2029-12-31T00:00:00Z",
            "identity": {
                "id": "id-1",
                "schema_id": "default",
                "traits": { "email": "ann@x.com", "name": { "first": "Ann" } }
            }
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "sess-1");
        assert!(session.active);
        assert!(session.expires_at.is_some());
        assert_eq!(session.identity.id, "id-1");
        assert_eq!(session.identity.email().unwrap(), "ann@x.com");
    }
}
