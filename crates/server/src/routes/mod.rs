//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                       - Liveness text
//! GET    /health                 - Process liveness
//! GET    /health/ready           - Store reachability
//!
//! # Reads (no auth)
//! GET    /featured-habits        - Six newest habits
//! GET    /public-habits          - Filter by ?category= and ?search=
//! GET    /my-habits/{email}      - Habits created by email
//! GET    /habit/{id}             - One habit
//!
//! # Writes (bearer token)
//! POST   /add-habit              - Create
//! PUT    /update-habit/{id}      - Replace editable fields (owner only)
//! DELETE /habit/{id}             - Remove (owner only)
//! PATCH  /habit/complete/{id}    - Record today's completion
//! ```

pub mod habits;
pub mod health;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    middleware,
    routing::{get, patch, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Habit resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(habits::root))
        .route("/featured-habits", get(habits::featured))
        .route("/public-habits", get(habits::public))
        .route("/my-habits/{email}", get(habits::by_owner))
        .route("/add-habit", post(habits::add))
        .route("/update-habit/{id}", put(habits::update))
        .route("/habit/{id}", get(habits::show).delete(habits::remove))
        .route("/habit/complete/{id}", patch(habits::complete))
}

/// The full application: health checks, habit routes, tracing and request IDs.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}
