//! PostgreSQL profile store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{TravelPreferences, UpdateProfileInput, UpdateTravelPreferencesInput, User};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::{ProfileStore, ProfileStoreError, ProfileStoreResult, SEARCH_LIMIT};

/// Schema statements, executed in order on startup.
const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(36) PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        first_name VARCHAR(255),
        last_name VARCHAR(255),
        profile_picture TEXT,
        bio TEXT,
        interests TEXT[],
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS travel_preferences (
        id VARCHAR(36) PRIMARY KEY,
        user_id VARCHAR(36) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        preferred_activities TEXT[],
        travel_style VARCHAR(255),
        languages_spoken TEXT[],
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    // Earlier deployments could store several rows per user; keep the most
    // recently updated one so the unique index below can be built.
    r#"
    DELETE FROM travel_preferences stale
    USING travel_preferences newer
    WHERE stale.user_id = newer.user_id
      AND (stale.updated_at, stale.id) < (newer.updated_at, newer.id)
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_travel_preferences_user_id
    ON travel_preferences (user_id)
    "#,
];

// NULL arrays and NULL array elements both come back as plain `Vec<String>`.
const USER_COLUMNS: &str = "id, email, first_name, last_name, profile_picture, bio, \
     COALESCE(array_remove(interests, NULL), '{}') AS interests, created_at, updated_at";

const TRAVEL_PREFERENCES_COLUMNS: &str = "id, user_id, \
     COALESCE(array_remove(preferred_activities, NULL), '{}') AS preferred_activities, \
     travel_style, \
     COALESCE(array_remove(languages_spoken, NULL), '{}') AS languages_spoken, \
     created_at, updated_at";

/// Database row for User
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_picture: Option<String>,
    bio: Option<String>,
    interests: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture: row.profile_picture,
            bio: row.bio,
            interests: row.interests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for TravelPreferences
#[derive(Debug, FromRow)]
struct TravelPreferencesRow {
    id: String,
    user_id: String,
    preferred_activities: Vec<String>,
    travel_style: Option<String>,
    languages_spoken: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TravelPreferencesRow> for TravelPreferences {
    fn from(row: TravelPreferencesRow) -> Self {
        TravelPreferences {
            id: row.id,
            user_id: row.user_id,
            preferred_activities: row.preferred_activities,
            travel_style: row.travel_style,
            languages_spoken: row.languages_spoken,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Builds a `LIKE` pattern matching `query` as a literal, lowercased
/// substring.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Maps constraint violations on writes to domain errors.
fn write_error(
    operation: &'static str,
    entity_type: &'static str,
    id: &str,
    err: sqlx::Error,
) -> ProfileStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ProfileStoreError::already_exists(entity_type, id);
        }
        if db_err.is_foreign_key_violation() {
            return ProfileStoreError::not_found("User", id);
        }
    }
    ProfileStoreError::query(operation, err)
}

/// PostgreSQL profile store.
///
/// The pool is cheap to clone and safe to share between concurrent requests.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and returns a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> ProfileStoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the tables and indexes if they do not exist.
    pub async fn init(&self) -> ProfileStoreResult<()> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| ProfileStoreError::query("initializing schema", e))?;
        }
        debug!("Profile schema ready");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_user(&self, id: &str) -> ProfileStoreResult<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ProfileStoreError::query("querying user", e))?;

        row.map(User::from)
            .ok_or_else(|| ProfileStoreError::not_found("User", id))
    }

    async fn create_user(&self, id: &str, email: &str) -> ProfileStoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, email) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("creating user", "User", id, e))?;

        debug!(user_id = %id, "Created user");
        Ok(row.into())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        input: &UpdateProfileInput,
    ) -> ProfileStoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                profile_picture = COALESCE($4, profile_picture),
                bio = COALESCE($5, bio),
                interests = COALESCE($6::text[], interests),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.first_name.as_deref())
        .bind(input.last_name.as_deref())
        .bind(input.profile_picture.as_deref())
        .bind(input.bio.as_deref())
        .bind(input.interests.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProfileStoreError::query("updating profile", e))?;

        row.map(User::from)
            .ok_or_else(|| ProfileStoreError::not_found("User", user_id))
    }

    async fn search_users(&self, query: &str) -> ProfileStoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE
                LOWER(email) LIKE $1 OR
                LOWER(COALESCE(first_name, '')) LIKE $1 OR
                LOWER(COALESCE(last_name, '')) LIKE $1 OR
                LOWER(COALESCE(bio, '')) LIKE $1
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(SEARCH_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProfileStoreError::query("searching users", e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_travel_preferences(
        &self,
        user_id: &str,
    ) -> ProfileStoreResult<Option<TravelPreferences>> {
        let row: Option<TravelPreferencesRow> = sqlx::query_as(&format!(
            "SELECT {TRAVEL_PREFERENCES_COLUMNS} FROM travel_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProfileStoreError::query("querying travel preferences", e))?;

        Ok(row.map(TravelPreferences::from))
    }

    async fn update_travel_preferences(
        &self,
        user_id: &str,
        input: &UpdateTravelPreferencesInput,
    ) -> ProfileStoreResult<TravelPreferences> {
        let row: TravelPreferencesRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO travel_preferences
                (id, user_id, preferred_activities, travel_style, languages_spoken)
            VALUES ($1, $2, COALESCE($3::text[], '{{}}'), $4, COALESCE($5::text[], '{{}}'))
            ON CONFLICT (user_id) DO UPDATE SET
                preferred_activities =
                    COALESCE($3::text[], travel_preferences.preferred_activities),
                travel_style = COALESCE($4, travel_preferences.travel_style),
                languages_spoken = COALESCE($5::text[], travel_preferences.languages_spoken),
                updated_at = NOW()
            RETURNING {TRAVEL_PREFERENCES_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(input.preferred_activities.as_deref())
        .bind(input.travel_style.as_deref())
        .bind(input.languages_spoken.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("updating travel preferences", "TravelPreferences", user_id, e))?;

        debug!(user_id = %user_id, "Upserted travel preferences");
        Ok(row.into())
    }
}
