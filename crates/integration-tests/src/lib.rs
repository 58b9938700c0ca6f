//! Integration test helpers for the habit tracker server.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory store. Identity comes from [`StaticVerifier`],
//! which accepts tokens of the form `token-for:<email>`, or from a
//! `FirebaseVerifier` over the checked-in test key set.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p habit-tracker-integration-tests
//!
//! # Including the MongoDB-backed tests
//! MONGODB_TEST_URI=mongodb://localhost:27017 \
//!     cargo test -p habit-tracker-integration-tests -- --include-ignored
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use habit_tracker_core::Email;
use habit_tracker_server::db::{HabitStore, InMemoryHabitStore};
use habit_tracker_server::routes;
use habit_tracker_server::services::{IdentityVerifier, VerifiedIdentity, VerifyError};
use habit_tracker_server::state::AppState;

const TOKEN_PREFIX: &str = "token-for:";

/// Test signing key (PKCS#8 PEM) matching `TEST_JWKS`.
pub const TEST_PRIVATE_KEY: &str =
    include_str!("../../server/tests/fixtures/test_service_account_key.pem");

/// JWK set with the public half of `TEST_PRIVATE_KEY` under kid `test-key-1`.
pub const TEST_JWKS: &str = include_str!("../../server/tests/fixtures/test_jwks.json");

/// Accepts `token-for:<email>` and rejects everything else.
pub struct StaticVerifier;

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let email = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| VerifyError::Rejected("unknown test token".into()))?;
        let email = Email::parse(email).map_err(|_| VerifyError::MissingEmail)?;

        Ok(VerifiedIdentity {
            uid: format!("uid-{email}"),
            email,
        })
    }
}

/// Bearer token [`StaticVerifier`] accepts for `email`.
#[must_use]
pub fn token_for(email: &str) -> String {
    format!("{TOKEN_PREFIX}{email}")
}

/// A router over a fresh in-memory store, plus a handle on that store.
#[must_use]
pub fn test_app() -> (Router, Arc<InMemoryHabitStore>) {
    let store = Arc::new(InMemoryHabitStore::new());
    let app = app_with(store.clone(), Arc::new(StaticVerifier));
    (app, store)
}

/// A router over explicit collaborators.
#[must_use]
pub fn app_with(store: Arc<dyn HabitStore>, verifier: Arc<dyn IdentityVerifier>) -> Router {
    routes::router(AppState::new(store, verifier))
}

/// Response status and body. JSON bodies are parsed; anything else is
/// returned as a JSON string.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Send one request through `app`.
///
/// # Panics
///
/// Panics if the request cannot be built or the body cannot be read.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    TestResponse { status, body }
}

/// JSON body for `POST /add-habit`.
#[must_use]
pub fn habit_payload(title: &str, category: &str, owner: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": format!("{title} every day"),
        "category": category,
        "reminderTime": "08:00",
        "image": "https://img.example/habit.png",
        "creatorEmail": owner,
    })
}
