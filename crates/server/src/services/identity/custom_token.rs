//! Firebase custom token minting.
//!
//! A custom token is an RS256 JWT signed with the service account key. The
//! client exchanges it with Firebase Auth for an ID token, which the server
//! then verifies with [`super::FirebaseVerifier`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use habit_tracker_core::Email;

use super::{CredentialError, ServiceAccount};

/// Audience Firebase Auth expects on custom tokens.
pub const IDENTITY_TOOLKIT_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

const MAX_UID_LEN: usize = 128;
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Claims of a Firebase custom token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<serde_json::Value>,
}

/// Signs custom tokens for one service account.
pub struct CustomTokenSigner {
    client_email: String,
    key_id: Option<String>,
    key: EncodingKey,
}

impl std::fmt::Debug for CustomTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomTokenSigner")
            .field("client_email", &self.client_email)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl CustomTokenSigner {
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidKey` if the account's key is not an RSA key.
    pub fn new(account: &ServiceAccount) -> Result<Self, CredentialError> {
        let key = EncodingKey::from_rsa_pem(account.private_key().expose_secret().as_bytes())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;

        Ok(Self {
            client_email: account.client_email.clone(),
            key_id: account.private_key_id.clone(),
            key,
        })
    }

    /// Mint a token for `uid`, valid for one hour from now.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the uid is empty or too long, or signing fails.
    pub fn mint(&self, uid: &str, email: Option<&Email>) -> Result<String, CredentialError> {
        self.mint_at(uid, email, Utc::now())
    }

    /// Mint a token as if issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the uid is empty or too long, or signing fails.
    pub fn mint_at(
        &self,
        uid: &str,
        email: Option<&Email>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        if uid.is_empty() || uid.chars().count() > MAX_UID_LEN {
            return Err(CredentialError::InvalidUid);
        }

        let claims = CustomTokenClaims {
            iss: self.client_email.clone(),
            sub: self.client_email.clone(),
            aud: IDENTITY_TOOLKIT_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
            uid: uid.to_string(),
            claims: email.map(|email| json!({ "email": email.as_str() })),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key_id);

        encode(&header, &claims, &self.key).map_err(|e| CredentialError::Signing(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    use super::*;

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/test_service_account_key.pem");
    const TEST_PUBLIC_KEY: &str =
        include_str!("../../../tests/fixtures/test_service_account_key.pub.pem");
    const CLIENT_EMAIL: &str = "signer@habit-tracker-test.iam.gserviceaccount.com";

    fn signer() -> CustomTokenSigner {
        let mut account = ServiceAccount::new("habit-tracker-test", CLIENT_EMAIL, TEST_KEY).unwrap();
        account.private_key_id = Some("test-key-1".to_string());
        CustomTokenSigner::new(&account).unwrap()
    }

    fn decode_claims(token: &str) -> CustomTokenClaims {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[IDENTITY_TOOLKIT_AUDIENCE]);
        validation.set_issuer(&[CLIENT_EMAIL]);
        decode::<CustomTokenClaims>(
            token,
            &DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[test]
    fn test_mint_with_email() {
        let email = Email::parse("u1@x.com").unwrap();
        let token = signer().mint("uid-1", Some(&email)).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("test-key-1"));

        let claims = decode_claims(&token);
        assert_eq!(claims.sub, CLIENT_EMAIL);
        assert_eq!(claims.uid, "uid-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
        assert_eq!(claims.claims, Some(json!({ "email": "u1@x.com" })));
    }

    #[test]
    fn test_mint_without_email_omits_claims() {
        let token = signer().mint("uid-2", None).unwrap();
        assert_eq!(decode_claims(&token).claims, None);
    }

    #[test]
    fn test_mint_at_uses_issue_time() {
        let issued = Utc::now() - Duration::minutes(5);
        let token = signer().mint_at("uid-3", None, issued).unwrap();
        assert_eq!(decode_claims(&token).iat, issued.timestamp());
    }

    #[test]
    fn test_uid_bounds() {
        let signer = signer();
        assert!(matches!(signer.mint("", None), Err(CredentialError::InvalidUid)));
        assert!(matches!(
            signer.mint(&"u".repeat(129), None),
            Err(CredentialError::InvalidUid)
        ));
        assert!(signer.mint(&"u".repeat(128), None).is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains(CLIENT_EMAIL));
        assert!(!debug.contains("PRIVATE KEY"));
    }
}
