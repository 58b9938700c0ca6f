//! Firebase ID token verification.
//!
//! Firebase ID tokens are RS256 JWTs signed by Google. The public keys are
//! published as a JWK set and rotated regularly, so they are cached for an
//! hour and refetched early when a token names a key id the cache lacks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use habit_tracker_core::Email;

use super::{IdentityVerifier, VerifiedIdentity, VerifyError};

/// Google's JWK set for Firebase Auth ID tokens.
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const KEY_SET_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
}

enum KeySource {
    Remote {
        client: reqwest::Client,
        url: String,
        cache: Cache<(), Arc<JwkSet>>,
    },
    Static(Arc<JwkSet>),
}

/// Verifies Firebase Auth ID tokens for one project.
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    keys: KeySource,
}

impl FirebaseVerifier {
    /// Create a verifier that fetches Google's published signing keys.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(KEY_SET_TTL)
            .build();

        Self::with_source(
            project_id.into(),
            KeySource::Remote {
                client: reqwest::Client::new(),
                url: FIREBASE_JWKS_URL.to_string(),
                cache,
            },
        )
    }

    /// Create a verifier that trusts a fixed key set (emulators and tests).
    #[must_use]
    pub fn with_key_set(project_id: impl Into<String>, keys: JwkSet) -> Self {
        Self::with_source(project_id.into(), KeySource::Static(Arc::new(keys)))
    }

    fn with_source(project_id: String, keys: KeySource) -> Self {
        Self {
            issuer: format!("{ISSUER_PREFIX}{project_id}"),
            project_id,
            keys,
        }
    }

    /// Find the JWK for `kid`, refetching once if a cached set does not have it.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, VerifyError> {
        match &self.keys {
            KeySource::Static(set) => set
                .find(kid)
                .cloned()
                .ok_or_else(|| VerifyError::UnknownKey(kid.to_string())),
            KeySource::Remote { client, url, cache } => {
                let set = cached_key_set(client, url, cache).await?;
                if let Some(jwk) = set.find(kid) {
                    return Ok(jwk.clone());
                }

                debug!(kid, "signing key not in cached set, refetching");
                cache.invalidate(&()).await;
                let set = cached_key_set(client, url, cache).await?;
                set.find(kid)
                    .cloned()
                    .ok_or_else(|| VerifyError::UnknownKey(kid.to_string()))
            }
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);
        validation
    }
}

async fn cached_key_set(
    client: &reqwest::Client,
    url: &str,
    cache: &Cache<(), Arc<JwkSet>>,
) -> Result<Arc<JwkSet>, VerifyError> {
    cache
        .try_get_with((), async {
            let set = client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<JwkSet>()
                .await?;
            debug!(keys = set.keys.len(), "fetched Firebase signing keys");
            Ok::<_, reqwest::Error>(Arc::new(set))
        })
        .await
        .map_err(|e| VerifyError::KeySet(e.to_string()))
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Malformed(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing kid".into()))?;

        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| VerifyError::Rejected(e.to_string()))?;

        let claims = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| VerifyError::Rejected(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(VerifyError::Rejected("empty subject".into()));
        }

        let email = claims
            .email
            .as_deref()
            .map(Email::parse)
            .and_then(Result::ok)
            .ok_or_else(|| {
                warn!(uid = %claims.sub, "ID token without a valid email claim");
                VerifyError::MissingEmail
            })?;

        Ok(VerifiedIdentity {
            uid: claims.sub,
            email,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/test_service_account_key.pem");
    const TEST_JWKS: &str = include_str!("../../../tests/fixtures/test_jwks.json");
    const PROJECT: &str = "habit-tracker-test";

    fn verifier() -> FirebaseVerifier {
        FirebaseVerifier::with_key_set(PROJECT, serde_json::from_str(TEST_JWKS).unwrap())
    }

    fn sign(kid: &str, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(
            &header,
            claims,
            &EncodingKey::from_rsa_pem(TEST_KEY.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    fn claims(email: Option<&str>) -> serde_json::Value {
        let now = Utc::now().timestamp();
        let mut claims = json!({
            "iss": format!("{ISSUER_PREFIX}{PROJECT}"),
            "aud": PROJECT,
            "sub": "uid-1",
            "iat": now,
            "exp": now + 3600,
            "auth_time": now,
        });
        if let Some(email) = email {
            claims["email"] = json!(email);
        }
        claims
    }

    #[tokio::test]
    async fn test_valid_token() {
        let token = sign("test-key-1", &claims(Some("u1@x.com")));
        let identity = verifier().verify(&token).await.unwrap();

        assert_eq!(identity.uid, "uid-1");
        assert_eq!(identity.email.as_str(), "u1@x.com");
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let mut c = claims(Some("u1@x.com"));
        c["aud"] = json!("some-other-project");
        let token = sign("test-key-1", &c);

        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let mut c = claims(Some("u1@x.com"));
        c["iss"] = json!("https://accounts.google.com");
        let token = sign("test-key-1", &c);

        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let mut c = claims(Some("u1@x.com"));
        let past = Utc::now().timestamp() - 7200;
        c["iat"] = json!(past);
        c["exp"] = json!(past + 600);
        let token = sign("test-key-1", &c);

        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let token = sign("rotated-away", &claims(Some("u1@x.com")));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::UnknownKey(kid)) if kid == "rotated-away"
        ));
    }

    #[tokio::test]
    async fn test_missing_email() {
        let token = sign("test-key-1", &claims(None));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::MissingEmail)
        ));
    }

    #[tokio::test]
    async fn test_hmac_token_is_malformed() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims(Some("u1@x.com")),
            &EncodingKey::from_secret(b"not-a-firebase-key"),
        )
        .unwrap();

        assert!(matches!(
            verifier().verify(&token).await,
            Err(VerifyError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        assert!(matches!(
            verifier().verify("not.a.jwt").await,
            Err(VerifyError::Malformed(_))
        ));
    }
}
