//! Profile store trait definitions.

use async_trait::async_trait;
use entities::{TravelPreferences, UpdateProfileInput, UpdateTravelPreferencesInput, User};

use crate::ProfileStoreResult;

/// Trait for profile storage operations.
///
/// Implementations hold no cached copies: every call reads or writes the
/// backing store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Gets a user by ID. Fails with `NotFound` when no row matches.
    async fn get_user(&self, id: &str) -> ProfileStoreResult<User>;

    /// Creates a user with only the identity fields populated.
    ///
    /// Fails with `AlreadyExists` if the ID or email is taken.
    async fn create_user(&self, id: &str, email: &str) -> ProfileStoreResult<User>;

    /// Applies a partial profile update and refreshes `updated_at`.
    async fn update_profile(
        &self,
        user_id: &str,
        input: &UpdateProfileInput,
    ) -> ProfileStoreResult<User>;

    /// Case-insensitive substring search over email, names and bio.
    ///
    /// Returns at most [`crate::SEARCH_LIMIT`] users.
    async fn search_users(&self, query: &str) -> ProfileStoreResult<Vec<User>>;

    // =========================================================================
    // Travel preference operations
    // =========================================================================

    /// Gets a user's travel preferences, `None` if never set.
    async fn get_travel_preferences(
        &self,
        user_id: &str,
    ) -> ProfileStoreResult<Option<TravelPreferences>>;

    /// Creates or updates a user's travel preferences in one atomic step.
    async fn update_travel_preferences(
        &self,
        user_id: &str,
        input: &UpdateTravelPreferencesInput,
    ) -> ProfileStoreResult<TravelPreferences>;
}
