//! GraphQL schema.
//!
//! Thin resolvers over [`ProfileService`]. Every operation requires an
//! authenticated principal taken from the per-request [`RequestContext`].

use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Result, Schema,
    SimpleObject, ID,
};
use entities::{TravelPreferences, User};

use crate::error::ServerError;
use crate::middleware::RequestContext;
use crate::services::ProfileService;

/// The application schema.
pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema around a profile service.
pub fn build_schema(profiles: ProfileService) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(profiles)
        .finish()
}

/// Converts any application error into a GraphQL error with a `code`
/// extension.
fn gql_error(err: impl Into<ServerError>) -> async_graphql::Error {
    let err: ServerError = err.into();
    err.extend()
}

/// Returns the caller's user ID or fails with `UNAUTHENTICATED`.
fn authenticated<'a>(ctx: &Context<'a>) -> Result<&'a str> {
    match ctx.data_opt::<RequestContext>() {
        Some(request) => request.require_authenticated().map_err(gql_error),
        None => Err(ServerError::AuthenticationRequired.extend()),
    }
}

fn profiles<'a>(ctx: &Context<'a>) -> &'a ProfileService {
    ctx.data_unchecked::<ProfileService>()
}

/// User profile.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: ID,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self {
            id: ID(user.id),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture,
            bio: user.bio,
            interests: user.interests,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Travel preferences.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "TravelPreferences")]
pub struct TravelPreferencesObject {
    pub id: ID,
    pub user_id: ID,
    pub preferred_activities: Vec<String>,
    pub travel_style: Option<String>,
    pub languages_spoken: Vec<String>,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

impl From<TravelPreferences> for TravelPreferencesObject {
    fn from(prefs: TravelPreferences) -> Self {
        Self {
            id: ID(prefs.id),
            user_id: ID(prefs.user_id),
            preferred_activities: prefs.preferred_activities,
            travel_style: prefs.travel_style,
            languages_spoken: prefs.languages_spoken,
            updated_at: prefs.updated_at.to_rfc3339(),
        }
    }
}

/// Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, InputObject)]
#[graphql(name = "UpdateProfileInput")]
pub struct UpdateProfileInputObject {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

impl From<UpdateProfileInputObject> for entities::UpdateProfileInput {
    fn from(input: UpdateProfileInputObject) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            profile_picture: input.profile_picture,
            bio: input.bio,
            interests: input.interests,
        }
    }
}

/// Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, InputObject)]
#[graphql(name = "UpdateTravelPreferencesInput")]
pub struct UpdateTravelPreferencesInputObject {
    pub preferred_activities: Option<Vec<String>>,
    pub travel_style: Option<String>,
    pub languages_spoken: Option<Vec<String>>,
}

impl From<UpdateTravelPreferencesInputObject> for entities::UpdateTravelPreferencesInput {
    fn from(input: UpdateTravelPreferencesInputObject) -> Self {
        Self {
            preferred_activities: input.preferred_activities,
            travel_style: input.travel_style,
            languages_spoken: input.languages_spoken,
        }
    }
}

/// Query resolvers.
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The caller's profile, created on first access.
    async fn current_user(&self, ctx: &Context<'_>) -> Result<UserObject> {
        let user_id = authenticated(ctx)?;
        let user = profiles(ctx)
            .get_or_create_user(user_id)
            .await
            .map_err(gql_error)?;
        Ok(user.into())
    }

    /// A user by ID.
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<UserObject> {
        authenticated(ctx)?;
        let user = profiles(ctx).get_user(&id).await.map_err(gql_error)?;
        Ok(user.into())
    }

    /// The caller's travel preferences, null if never set.
    async fn travel_preferences(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Option<TravelPreferencesObject>> {
        let user_id = authenticated(ctx)?;
        let prefs = profiles(ctx)
            .get_travel_preferences(user_id)
            .await
            .map_err(gql_error)?;
        Ok(prefs.map(Into::into))
    }

    /// Users whose email, name or bio contain `query` (case-insensitive,
    /// at most 20).
    async fn search_users(&self, ctx: &Context<'_>, query: String) -> Result<Vec<UserObject>> {
        authenticated(ctx)?;
        let users = profiles(ctx).search_users(&query).await.map_err(gql_error)?;
        Ok(users.into_iter().map(Into::into).collect())
    }
}

/// Mutation resolvers.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Updates the caller's profile.
    async fn update_profile(
        &self,
        ctx: &Context<'_>,
        input: UpdateProfileInputObject,
    ) -> Result<UserObject> {
        let user_id = authenticated(ctx)?;
        let user = profiles(ctx)
            .update_profile(user_id, &input.into())
            .await
            .map_err(gql_error)?;
        Ok(user.into())
    }

    /// Creates or updates the caller's travel preferences.
    async fn update_travel_preferences(
        &self,
        ctx: &Context<'_>,
        input: UpdateTravelPreferencesInputObject,
    ) -> Result<TravelPreferencesObject> {
        let user_id = authenticated(ctx)?;
        let prefs = profiles(ctx)
            .update_travel_preferences(user_id, &input.into())
            .await
            .map_err(gql_error)?;
        Ok(prefs.into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::{Request, Response, Value};
    use auth::{Identity, MemoryIdentityProvider, Session};
    use profile_store::{MemoryProfileStore, ProfileStore};
    use serde_json::json;

    use super::*;
    use crate::middleware::Principal;

    struct Harness {
        schema: ApiSchema,
        store: MemoryProfileStore,
    }

    async fn harness() -> Harness {
        let store = MemoryProfileStore::new();
        let identity = Arc::new(MemoryIdentityProvider::new());
        identity
            .add_identity(Identity::new("id-ann").with_trait("email", "ann@x.com"))
            .await;
        let profiles = ProfileService::new(Arc::new(store.clone()), identity);
        Harness {
            schema: build_schema(profiles),
            store,
        }
    }

    fn as_user(user_id: &str) -> RequestContext {
        let session = Session::new("session-1", Identity::new(user_id));
        RequestContext::authenticated(Principal::from(session))
    }

    async fn run(schema: &ApiSchema, query: &str, context: RequestContext) -> Response {
        schema.execute(Request::new(query).data(context)).await
    }

    fn data(response: Response) -> serde_json::Value {
        assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    fn error_code(response: &Response) -> Option<Value> {
        response.errors.first()?.extensions.as_ref()?.get("code").cloned()
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthenticated() {
        let h = harness().await;
        let response = run(&h.schema, "{ currentUser { id } }", RequestContext::anonymous()).await;

        assert_eq!(error_code(&response), Some(Value::from("UNAUTHENTICATED")));
        assert_eq!(h.store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_current_user_provisions() {
        let h = harness().await;
        let query = "{ currentUser { id email interests } }";

        let first = data(run(&h.schema, query, as_user("id-ann")).await);
        let second = data(run(&h.schema, query, as_user("id-ann")).await);

        assert_eq!(
            first,
            json!({ "currentUser": { "id": "id-ann", "email": "ann@x.com", "interests": [] } })
        );
        assert_eq!(first, second);
        assert_eq!(h.store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_current_user_without_identity_is_upstream_failure() {
        let h = harness().await;
        let response = run(&h.schema, "{ currentUser { id } }", as_user("id-ghost")).await;
        assert_eq!(error_code(&response), Some(Value::from("UPSTREAM_FAILURE")));
    }

    #[tokio::test]
    async fn test_user_not_found() {
        let h = harness().await;
        let response = run(&h.schema, r#"{ user(id: "nobody") { id } }"#, as_user("id-ann")).await;
        assert_eq!(error_code(&response), Some(Value::from("NOT_FOUND")));
    }

    #[tokio::test]
    async fn test_update_profile_and_search() {
        let h = harness().await;
        h.store.create_user("id-ann", "ann@x.com").await.unwrap();
        h.store.create_user("id-bob", "bob@x.com").await.unwrap();

        let updated = data(
            run(
                &h.schema,
                r#"mutation {
                    updateProfile(input: { firstName: "Bob", bio: "Annapurna trekker" }) {
                        firstName lastName bio
                    }
                }"#,
                as_user("id-bob"),
            )
            .await,
        );
        assert_eq!(
            updated,
            json!({ "updateProfile": {
                "firstName": "Bob", "lastName": null, "bio": "Annapurna trekker"
            } })
        );

        let found = data(
            run(&h.schema, r#"{ searchUsers(query: "ANN") { id } }"#, as_user("id-ann")).await,
        );
        let mut ids: Vec<String> = found["searchUsers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["id-ann", "id-bob"]);
    }

    #[tokio::test]
    async fn test_travel_preferences_round() {
        let h = harness().await;
        h.store.create_user("id-ann", "ann@x.com").await.unwrap();

        let empty = data(
            run(&h.schema, "{ travelPreferences { id } }", as_user("id-ann")).await,
        );
        assert_eq!(empty, json!({ "travelPreferences": null }));

        data(
            run(
                &h.schema,
                r#"mutation { updateTravelPreferences(input: { preferredActivities: ["hiking"] }) { id } }"#,
                as_user("id-ann"),
            )
            .await,
        );
        let prefs = data(
            run(
                &h.schema,
                r#"mutation {
                    updateTravelPreferences(input: { languagesSpoken: ["en"] }) {
                        userId preferredActivities languagesSpoken travelStyle
                    }
                }"#,
                as_user("id-ann"),
            )
            .await,
        );

        assert_eq!(
            prefs,
            json!({ "updateTravelPreferences": {
                "userId": "id-ann",
                "preferredActivities": ["hiking"],
                "languagesSpoken": ["en"],
                "travelStyle": null
            } })
        );
    }
}
