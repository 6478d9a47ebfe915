//! Profile service.
//!
//! Sits on top of the profile store and adds lazy provisioning: a local user
//! record is created the first time an identity is referenced.

use std::sync::Arc;

use auth::{AuthError, IdentityProvider, Session};
use entities::{TravelPreferences, UpdateProfileInput, UpdateTravelPreferencesInput, User};
use profile_store::{ProfileStore, ProfileStoreError};
use tracing::{debug, info};

/// Profile service error type.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Store error, propagated unchanged.
    #[error(transparent)]
    Store(#[from] ProfileStoreError),

    /// The identity backing a new user could not be read.
    #[error("failed to get user info for {user_id} from identity provider: {source}")]
    Provisioning {
        user_id: String,
        #[source]
        source: AuthError,
    },

    /// The session could not be validated.
    #[error("invalid session: {0}")]
    Session(#[source] AuthError),
}

/// Result type for profile service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Profile service.
///
/// Cheap to clone; both collaborators are shared.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl ProfileService {
    /// Creates a new profile service.
    pub fn new(store: Arc<dyn ProfileStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        Ok(self.store.get_user(id).await?)
    }

    /// Gets a user, creating the local record from the identity provider
    /// on first reference.
    ///
    /// A concurrent request may create the same user between the lookup and
    /// the insert; the resulting conflict is answered by re-reading the row.
    pub async fn get_or_create_user(&self, id: &str) -> ServiceResult<User> {
        match self.store.get_user(id).await {
            Ok(user) => return Ok(user),
            Err(err) => debug!(user_id = %id, error = %err, "User not loaded, provisioning"),
        }

        let identity = self
            .identity
            .get_identity(id)
            .await
            .map_err(|source| ServiceError::Provisioning {
                user_id: id.to_string(),
                source,
            })?;
        let email = identity.email().map_err(|source| ServiceError::Provisioning {
            user_id: id.to_string(),
            source,
        })?;

        match self.store.create_user(id, email).await {
            Ok(user) => {
                info!(user_id = %id, "Provisioned user");
                Ok(user)
            }
            Err(err) if err.is_conflict() => {
                debug!(user_id = %id, "User created concurrently, re-reading");
                self.store
                    .get_user(id)
                    .await
                    .map_err(|_| ServiceError::Store(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Applies a partial profile update.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: &UpdateProfileInput,
    ) -> ServiceResult<User> {
        Ok(self.store.update_profile(user_id, input).await?)
    }

    /// Gets a user's travel preferences, `None` if never set.
    pub async fn get_travel_preferences(
        &self,
        user_id: &str,
    ) -> ServiceResult<Option<TravelPreferences>> {
        Ok(self.store.get_travel_preferences(user_id).await?)
    }

    /// Creates or updates a user's travel preferences.
    pub async fn update_travel_preferences(
        &self,
        user_id: &str,
        input: &UpdateTravelPreferencesInput,
    ) -> ServiceResult<TravelPreferences> {
        Ok(self.store.update_travel_preferences(user_id, input).await?)
    }

    /// Searches users by email, name or bio.
    pub async fn search_users(&self, query: &str) -> ServiceResult<Vec<User>> {
        Ok(self.store.search_users(query).await?)
    }

    /// Validates a session token with the identity provider.
    pub async fn get_user_session(&self, session_token: &str) -> ServiceResult<Session> {
        self.identity
            .validate_session(session_token)
            .await
            .map_err(ServiceError::Session)
    }
}
