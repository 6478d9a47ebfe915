//! Application state.

use std::sync::Arc;

use auth::IdentityProvider;
use profile_store::ProfileStore;

use crate::api::graphql::{ApiSchema, build_schema};
use crate::config::Config;
use crate::services::ProfileService;

/// Shared application state.
///
/// Everything in here is read-only after startup; the store's connection
/// pool and the identity client handle their own concurrency.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Profile service.
    pub profiles: ProfileService,
    /// GraphQL schema.
    pub schema: ApiSchema,
}

impl AppState {
    /// Creates new application state.
    pub fn new(
        config: Config,
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let profiles = ProfileService::new(store, identity);
        let schema = build_schema(profiles.clone());
        Self {
            config,
            profiles,
            schema,
        }
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<AppState>;

/// Creates shared state from config, store and identity provider.
pub fn create_shared_state(
    config: Config,
    store: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
) -> SharedState {
    Arc::new(AppState::new(config, store, identity))
}
