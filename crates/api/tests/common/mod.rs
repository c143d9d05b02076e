//! Shared helpers for HTTP-level integration tests.
//!
//! Uses Axum's `tower::ServiceExt::oneshot` to send requests directly to
//! the router without a TCP listener. Database fixtures come from
//! `#[sqlx::test]`, which provisions an isolated database per test.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use rehome_api::auth::jwt::{generate_access_token, JwtConfig};
use rehome_api::config::ServerConfig;
use rehome_api::router::build_app_router;
use rehome_api::state::AppState;
use rehome_core::types::DbId;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(rehome_events::EventBus::default()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Insert a user with the given role and mint a matching access token.
///
/// The password hash is a placeholder; token-based tests never log in.
pub async fn seed_user(pool: &PgPool, username: &str, role: &str) -> (DbId, String) {
    let role_id: (DbId,) = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(role)
        .fetch_one(pool)
        .await
        .expect("role should be seeded");

    let user_id: (DbId,) = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, role_id)
         VALUES ($1, $2, 'x', $3)
         RETURNING id",
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(role_id.0)
    .fetch_one(pool)
    .await
    .expect("user insert should succeed");

    let token = generate_access_token(user_id.0, role, &test_config().jwt)
        .expect("token generation should succeed");
    (user_id.0, token)
}

/// Insert a regular member user.
pub async fn seed_member(pool: &PgPool, username: &str) -> (DbId, String) {
    seed_user(pool, username, "member").await
}

/// Insert an admin user.
pub async fn seed_admin(pool: &PgPool, username: &str) -> (DbId, String) {
    seed_user(pool, username, "admin").await
}

/// Create a pet owned by `owner_id` and return the pet id.
pub async fn seed_pet(pool: &PgPool, owner_id: DbId, name: &str) -> DbId {
    let pet = rehome_db::repositories::PetRepo::create(
        pool,
        &rehome_db::models::pet::CreatePet {
            name: name.to_string(),
            species: "dog".to_string(),
        },
        owner_id,
    )
    .await
    .expect("pet creation should succeed");
    pet.id
}

/// Create an active helper profile for a user and return the profile id.
pub async fn seed_helper_profile(pool: &PgPool, user_id: DbId) -> DbId {
    let profile = rehome_db::repositories::HelperProfileRepo::create(
        pool,
        user_id,
        &rehome_db::models::helper_profile::CreateHelperProfile { bio: None },
    )
    .await
    .expect("helper profile creation should succeed");
    profile.id
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn auth_get(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body, without authentication.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and a Bearer token.
pub async fn auth_post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send an authenticated POST with an empty body.
pub async fn auth_post(app: Router, uri: &str, token: &str) -> Response<Body> {
    auth_post_json(app, uri, token, serde_json::json!({})).await
}

/// Send an authenticated DELETE request.
pub async fn auth_delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into parsed JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Assert a status and return the parsed body, with a useful failure message.
pub async fn expect_status(
    response: Response<Body>,
    expected: StatusCode,
) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}
