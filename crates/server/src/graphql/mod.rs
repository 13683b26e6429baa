//! GraphQL API
//!
//! Schema, resolvers and the axum handlers that serve them. Shared services
//! (store, auth, clock) are registered as schema data; the per-request
//! [`Ctx`] is attached to each request before execution.

mod mutation;
mod query;
mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use types::{AddressObject, PersonObject, TokenObject, UserObject, YesNo};

use crate::config::AppState;
use crate::ctx::Ctx;
use async_graphql::{Context, EmptySubscription, Result, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use phonebook_core::{AuthManager, Clock, PhonebookStore, User};
use std::sync::Arc;

/// GraphQL schema type
pub type PhonebookSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(
    store: Arc<dyn PhonebookStore>,
    auth: Arc<AuthManager>,
    clock: Arc<dyn Clock>,
) -> PhonebookSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(store)
        .data(auth)
        .data(clock)
        .finish()
}

/// GraphQL query handler
pub async fn graphql_handler(
    State(state): State<AppState>,
    ctx: Ctx,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner().data(ctx)).await.into()
}

/// GraphQL playground handler
pub async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

fn store<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn PhonebookStore>> {
    ctx.data::<Arc<dyn PhonebookStore>>()
}

fn auth<'a>(ctx: &Context<'a>) -> Result<&'a Arc<AuthManager>> {
    ctx.data::<Arc<AuthManager>>()
}

fn clock<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn Clock>> {
    ctx.data::<Arc<dyn Clock>>()
}

/// Requests executed without a `Ctx` are anonymous.
fn current_user<'a>(ctx: &Context<'a>) -> Option<&'a User> {
    ctx.data_opt::<Ctx>().and_then(Ctx::current_user)
}
