//! HTTP Router
//!
//! Mounts the GraphQL endpoint behind the user-resolving middleware, plus a
//! health route.

use crate::config::AppState;
use crate::graphql::{graphql_handler, graphql_playground};
use crate::middleware::mw_resolve_user;
use axum::{middleware::from_fn_with_state, routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .route_layer(from_fn_with_state(state.clone(), mw_resolve_user))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK - Phonebook GraphQL Server"
}
