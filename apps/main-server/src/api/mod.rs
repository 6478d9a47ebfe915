//! API endpoints.

pub mod graphql;

use async_graphql::http::{GraphQLPlaygroundConfig, playground_source};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};

use crate::middleware::RequestContext;
use crate::state::SharedState;

/// Path of the GraphQL endpoint.
pub const QUERY_PATH: &str = "/query";

/// Creates the API router with all endpoints.
pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route(QUERY_PATH, get(graphql_handler).post(graphql_handler))
        .route("/playground", get(playground))
        .route("/health", get(health_check))
}

/// Executes a GraphQL request with the caller's request context.
async fn graphql_handler(
    State(state): State<SharedState>,
    context: RequestContext,
    request: GraphQLRequest,
) -> GraphQLResponse {
    state
        .schema
        .execute(request.into_inner().data(context))
        .await
        .into()
}

/// Interactive GraphQL explorer.
async fn playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new(QUERY_PATH)))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
