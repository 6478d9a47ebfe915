//! User-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user profile.
///
/// The `id` is issued by the identity provider and never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity provider ID.
    pub id: String,
    /// Email address (unique).
    pub email: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Profile picture URI.
    pub profile_picture: Option<String>,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Interests, in stored order.
    #[serde(default)]
    pub interests: Vec<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with only the identity fields populated.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            profile_picture: None,
            bio: None,
            interests: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial profile update. `updated_at` is not touched.
    pub fn apply(&mut self, input: &UpdateProfileInput) {
        if let Some(first_name) = &input.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &input.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(profile_picture) = &input.profile_picture {
            self.profile_picture = Some(profile_picture.clone());
        }
        if let Some(bio) = &input.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(interests) = &input.interests {
            self.interests = interests.clone();
        }
    }

    /// Returns true if `needle` (already lowercased) occurs in the email,
    /// first name, last name or bio. Missing fields match as empty strings.
    pub fn matches(&self, needle: &str) -> bool {
        [
            Some(self.email.as_str()),
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.bio.as_deref(),
        ]
        .into_iter()
        .any(|field| field.unwrap_or_default().to_lowercase().contains(needle))
    }
}

/// Partial update of a user's profile.
///
/// `None` leaves a field unchanged. There is no way to clear a field back to
/// NULL; `interests` is replaced as a whole sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}
