//! Common test utilities for integration tests.
//!
//! The app is built over the in-memory store so these tests run without a
//! database. Each test gets its own store and seeds what it needs.

// Helpers are shared by several test binaries; not every binary uses all of them.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use crowdstack_api::{
    app::{create_app, AppState, Stores},
    config::{
        AuthConfig, Config, DatabaseConfig, DoorPassConfig, InvitesConfig, LoggingConfig,
        SecurityConfig, ServerConfig,
    },
};
use domain::models::{CheckInPolicy, InviteMetadata, Role};
use domain::services::{InMemoryStore, UserRoleStore};
use fake::faker::name::en::Name;
use fake::Fake;
use shared::jwt::SessionKeys;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const PASS_SECRET: &str = "integration-pass-secret-abcdefghijklmnop";
pub const APP_BASE_URL: &str = "https://app.crowdstack.test";

/// Test configuration with rate limiting disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0, // Disable rate limiting for tests
            trust_forwarded_for: false,
        },
        auth: AuthConfig {
            jwt_secret: SESSION_SECRET.to_string(),
            audience: "authenticated".to_string(),
            leeway_secs: 0,
            session_cookie: "sb-access-token".to_string(),
        },
        door_pass: DoorPassConfig {
            signing_secret: PASS_SECRET.to_string(),
            ttl_secs: 0,
            check_in_policy: CheckInPolicy::SingleUse,
        },
        invites: InvitesConfig {
            app_base_url: APP_BASE_URL.to_string(),
        },
    }
}

/// Create a test application router over `store`.
pub fn create_test_app(store: Arc<InMemoryStore>) -> Router {
    create_test_app_with_config(test_config(), store)
}

pub fn create_test_app_with_config(config: Config, store: Arc<InMemoryStore>) -> Router {
    let state = AppState::new(config, Stores::in_memory(store), None)
        .expect("Failed to build app state");
    create_app(state)
}

/// Issue a session token the way the auth platform would.
pub fn session_token(user_id: Uuid) -> String {
    SessionKeys::new(SESSION_SECRET, "authenticated", 0)
        .unwrap()
        .issue(user_id, 3600)
        .unwrap()
}

/// Grant `role` directly in the store.
pub async fn grant_role(store: &InMemoryStore, user_id: Uuid, role: Role) {
    store
        .upsert_role(user_id, role, &InviteMetadata::new())
        .await
        .expect("Failed to grant role");
}

pub fn attendee_name() -> String {
    Name().fake()
}

/// Build a JSON request, optionally authenticated.
pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request without a body, optionally authenticated.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}
