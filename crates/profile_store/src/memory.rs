//! In-memory profile store implementation for testing.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use entities::{TravelPreferences, UpdateProfileInput, UpdateTravelPreferencesInput, User};
use tokio::sync::RwLock;

use crate::{ProfileStore, ProfileStoreError, ProfileStoreResult, SEARCH_LIMIT};

/// In-memory profile store for tests and local runs.
///
/// Enforces the same uniqueness rules as the PostgreSQL schema: unique user
/// ID, unique email and at most one preferences record per user.
#[derive(Debug, Default, Clone)]
pub struct MemoryProfileStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    /// Keyed by user ID.
    travel_preferences: Arc<RwLock<HashMap<String, TravelPreferences>>>,
}

impl MemoryProfileStore {
    /// Creates a new in-memory profile store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_user(&self, id: &str) -> ProfileStoreResult<User> {
        let users = self.users.read().await;
        users
            .get(id)
            .cloned()
            .ok_or_else(|| ProfileStoreError::not_found("User", id))
    }

    async fn create_user(&self, id: &str, email: &str) -> ProfileStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(id) {
            return Err(ProfileStoreError::already_exists("User", id));
        }
        if users.values().any(|u| u.email == email) {
            return Err(ProfileStoreError::already_exists("User", email));
        }
        let user = User::new(id, email);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        input: &UpdateProfileInput,
    ) -> ProfileStoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ProfileStoreError::not_found("User", user_id))?;
        user.apply(input);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn search_users(&self, query: &str) -> ProfileStoreResult<Vec<User>> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|u| u.matches(&needle))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        result.truncate(SEARCH_LIMIT);
        Ok(result)
    }

    async fn get_travel_preferences(
        &self,
        user_id: &str,
    ) -> ProfileStoreResult<Option<TravelPreferences>> {
        let prefs = self.travel_preferences.read().await;
        Ok(prefs.get(user_id).cloned())
    }

    async fn update_travel_preferences(
        &self,
        user_id: &str,
        input: &UpdateTravelPreferencesInput,
    ) -> ProfileStoreResult<TravelPreferences> {
        let users = self.users.read().await;
        if !users.contains_key(user_id) {
            return Err(ProfileStoreError::not_found("User", user_id));
        }

        let mut prefs = self.travel_preferences.write().await;
        let record = prefs
            .entry(user_id.to_string())
            .and_modify(|existing| {
                existing.apply(input);
                existing.updated_at = Utc::now();
            })
            .or_insert_with(|| TravelPreferences::new(user_id, input));
        Ok(record.clone())
    }
}
