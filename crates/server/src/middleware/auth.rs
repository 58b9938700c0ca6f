//! Bearer token authentication.
//!
//! Write routes take [`RequireIdentity`]. A request without a usable
//! `Authorization: Bearer <token>` header is rejected with 401; a token the
//! verifier refuses is rejected with 403.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{Span, warn};

use crate::error::{AppError, set_sentry_user};
use crate::services::VerifiedIdentity;
use crate::state::AppState;

const MISSING_TOKEN: &str = "Unauthorized: Access token required.";
const INVALID_TOKEN: &str = "Unauthorized: Invalid or expired token.";

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` for a missing header, another scheme, or an empty token.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that requires a verified bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn add_habit(
///     RequireIdentity(identity): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
pub struct RequireIdentity(pub VerifiedIdentity);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.to_string()))?;

        let identity = state.verifier().verify(token).await.map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            AppError::Forbidden(INVALID_TOKEN.to_string())
        })?;

        Span::current().record("user", identity.email.as_str());
        set_sentry_user(&identity.uid, identity.email.as_str());

        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{HeaderValue, Request, StatusCode};
    use habit_tracker_core::Email;

    use super::*;
    use crate::db::InMemoryHabitStore;
    use crate::services::{IdentityVerifier, VerifyError};

    struct OneToken;

    #[async_trait]
    impl IdentityVerifier for OneToken {
        async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
            if token == "good" {
                Ok(VerifiedIdentity {
                    uid: "uid-1".into(),
                    email: Email::parse("u1@x.com").unwrap(),
                })
            } else {
                Err(VerifyError::Rejected("bad signature".into()))
            }
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn extract(authorization: Option<&str>) -> Result<RequireIdentity, AppError> {
        let state = AppState::new(Arc::new(InMemoryHabitStore::new()), Arc::new(OneToken));
        let mut builder = Request::builder().uri("/add-habit");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        RequireIdentity::from_request_parts(&mut parts, &state).await
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let err = extract(None).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), MISSING_TOKEN);
    }

    #[tokio::test]
    async fn test_rejected_token_is_forbidden() {
        let err = extract(Some("Bearer forged")).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), INVALID_TOKEN);
    }

    #[tokio::test]
    async fn test_valid_token() {
        let RequireIdentity(identity) = extract(Some("Bearer good")).await.ok().unwrap();
        assert_eq!(identity.email.as_str(), "u1@x.com");
    }
}
