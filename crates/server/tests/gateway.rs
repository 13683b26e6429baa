//! HTTP-level behaviour of the router: auth header handling and health.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use phonebook_core::{MemoryStore, SystemClock};
use phonebook_server::config::{AppState, ServerConfig};
use phonebook_server::router::router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = ServerConfig::new("gateway-test-secret");
    let state = AppState::new(
        &config,
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
    );
    router(state)
}

async fn graphql(app: &Router, query: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = request
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_missing_header_is_anonymous() {
    let app = app();
    let (status, body) = graphql(&app, "{ me { username } }", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["me"], Value::Null);
}

#[tokio::test]
async fn test_malformed_token_is_401() {
    let app = app();
    let (status, body) = graphql(&app, "{ me { username } }", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_non_bearer_non_ascii_header_is_anonymous() {
    let request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Basic \xe4bc").unwrap(),
        )
        .body(Body::from(json!({ "query": "{ me { username } }" }).to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["me"], Value::Null);
}

#[tokio::test]
async fn test_login_then_me() {
    let app = app();
    let (_, body) = graphql(
        &app,
        r#"mutation { createUser(username: "alice") { username } }"#,
        None,
    )
    .await;
    assert_eq!(body["data"]["createUser"]["username"], "alice");

    let (_, body) = graphql(
        &app,
        r#"mutation { login(username: "alice", password: "secret") { value } }"#,
        None,
    )
    .await;
    let token = body["data"]["login"]["value"].as_str().unwrap().to_string();

    let (status, body) = graphql(&app, "{ me { username friends { name } } }", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["me"],
        json!({ "username": "alice", "friends": [] })
    );
}

#[tokio::test]
async fn test_add_person_over_http() {
    let app = app();
    graphql(
        &app,
        r#"mutation { createUser(username: "alice") { username } }"#,
        None,
    )
    .await;
    let (_, body) = graphql(
        &app,
        r#"mutation { login(username: "alice", password: "secret") { value } }"#,
        None,
    )
    .await;
    let token = body["data"]["login"]["value"].as_str().unwrap().to_string();

    let mutation = r#"mutation {
        addPerson(name: "Pekka Mikkola", street: "Vilppulantie 25", city: "Helsinki", birthYear: 1990) { name }
    }"#;
    let (status, body) = graphql(&app, mutation, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");

    let (_, body) = graphql(&app, mutation, Some(&token)).await;
    assert_eq!(body["data"]["addPerson"]["name"], "Pekka Mikkola");

    let (_, body) = graphql(&app, "{ personCount me { friends { name } } }", Some(&token)).await;
    assert_eq!(body["data"]["personCount"], 1);
    assert_eq!(body["data"]["me"]["friends"][0]["name"], "Pekka Mikkola");
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_playground_served() {
    let response = app()
        .oneshot(Request::builder().uri("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
