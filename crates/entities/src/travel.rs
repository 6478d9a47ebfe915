//! Travel preference entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's travel preferences. At most one record exists per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPreferences {
    /// Unique identifier.
    pub id: String,
    /// Owning user ID.
    pub user_id: String,
    /// Preferred activities, in stored order.
    #[serde(default)]
    pub preferred_activities: Vec<String>,
    /// Travel style (e.g. "backpacking").
    pub travel_style: Option<String>,
    /// Languages spoken, in stored order.
    #[serde(default)]
    pub languages_spoken: Vec<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TravelPreferences {
    /// Creates the first preferences record for a user from an update input.
    pub fn new(user_id: impl Into<String>, input: &UpdateTravelPreferencesInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            preferred_activities: input.preferred_activities.clone().unwrap_or_default(),
            travel_style: input.travel_style.clone(),
            languages_spoken: input.languages_spoken.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update. `updated_at` is not touched.
    pub fn apply(&mut self, input: &UpdateTravelPreferencesInput) {
        if let Some(activities) = &input.preferred_activities {
            self.preferred_activities = activities.clone();
        }
        if let Some(style) = &input.travel_style {
            self.travel_style = Some(style.clone());
        }
        if let Some(languages) = &input.languages_spoken {
            self.languages_spoken = languages.clone();
        }
    }
}

/// Partial update of travel preferences. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTravelPreferencesInput {
    pub preferred_activities: Option<Vec<String>>,
    pub travel_style: Option<String>,
    pub languages_spoken: Option<Vec<String>>,
}
