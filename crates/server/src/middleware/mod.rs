//! HTTP middleware stack for the habit tracker API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, Sentry scope and response)
//!
//! Authentication is not a layer: write handlers take a [`RequireIdentity`]
//! extractor, so read routes stay open.

pub mod auth;
pub mod request_id;

pub use auth::{RequireIdentity, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
