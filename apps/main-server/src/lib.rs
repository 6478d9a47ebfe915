//! Travel social backend server
//!
//! Serves the GraphQL API for user profiles and travel preferences. Callers
//! are identified by their Ory Kratos session; users are provisioned lazily
//! from the identity provider on first access.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use auth::IdentityProvider;
use axum::{Router, middleware::from_fn_with_state};
use profile_store::ProfileStore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::session_middleware;
use crate::state::{SharedState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app(state: SharedState) -> Router {
    let timeout = state.config.request_timeout;

    let router = api::create_router()
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .with_state(state);
    with_http_layers(router, timeout)
}

/// Wraps a router in the HTTP layer stack.
///
/// From the outside in: CORS, `x-request-id` assignment, tracing, request id
/// propagation to the response, request timeout and panic recovery (a
/// panicking handler answers 500).
fn with_http_layers(router: Router, timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

/// Creates the application state with the given configuration, store and
/// identity provider.
pub fn create_state(
    config: Config,
    store: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
) -> SharedState {
    create_shared_state(config, store, identity)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use auth::{Identity, MemoryIdentityProvider};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use profile_store::MemoryProfileStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn app() -> (Router, Arc<MemoryIdentityProvider>) {
        let identity = Arc::new(MemoryIdentityProvider::new());
        identity
            .add_session(
                "token-ann",
                Identity::new("id-ann").with_trait("email", "ann@x.com"),
            )
            .await;
        let state = create_state(
            Config::default(),
            Arc::new(MemoryProfileStore::new()),
            identity.clone(),
        );
        (create_app(state), identity)
    }

    fn graphql() -> axum::http::request::Builder {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn body(query: &str) -> Body {
        Body::from(json!({ "query": query }).to_string())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let (app, _) = app().await;

        let generated = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(generated.headers().contains_key("x-request-id"));

        let forwarded = app
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forwarded.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_500() {
        async fn boom() -> &'static str {
            panic!("resolver bug")
        }
        let app = with_http_layers(
            Router::new().route("/boom", axum::routing::get(boom)),
            Duration::from_secs(5),
        );

        let response = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_current_user_over_http() {
        let (app, identity) = app().await;
        let query = "{ currentUser { id email } }";

        let response = app
            .oneshot(
                graphql()
                    .header(header::COOKIE, "ory_kratos_session=token-ann")
                    .body(body(query))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "data": { "currentUser": { "id": "id-ann", "email": "ann@x.com" } } })
        );
        // Session validation plus one identity lookup for provisioning.
        assert_eq!(identity.call_count(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_query_is_rejected_in_body() {
        let (app, _) = app().await;
        let query = "{ currentUser { id } }";

        let response = app
            .oneshot(graphql().body(body(query)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_invalid_session_is_401() {
        let (app, _) = app().await;
        let query = "{ currentUser { id } }";

        let response = app
            .oneshot(
                graphql()
                    .header(header::AUTHORIZATION, "Bearer stale")
                    .body(body(query))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
    }
}
