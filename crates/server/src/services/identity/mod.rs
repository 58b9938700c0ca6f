//! Identity verification.
//!
//! A bearer credential is turned into a [`VerifiedIdentity`] by an
//! [`IdentityVerifier`]. Production uses [`FirebaseVerifier`]; tests plug in
//! their own implementations.

mod credentials;
mod custom_token;
mod firebase;

pub use credentials::{CredentialError, ServiceAccount, normalize_private_key};
pub use custom_token::{CustomTokenClaims, CustomTokenSigner, IDENTITY_TOOLKIT_AUDIENCE};
pub use firebase::FirebaseVerifier;

use async_trait::async_trait;
use thiserror::Error;

use habit_tracker_core::Email;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider user id (`sub` claim).
    pub uid: String,
    /// Verified email; compared against `creatorEmail` for ownership.
    pub email: Email,
}

/// Reasons a bearer credential is rejected.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Not a well-formed token for this verifier.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signature, expiry, audience or issuer check failed.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The token names a signing key the provider does not publish.
    #[error("unknown signing key: {0}")]
    UnknownKey(String),

    /// The token carries no usable email claim.
    #[error("token has no valid email claim")]
    MissingEmail,

    /// The provider's public keys could not be fetched.
    #[error("failed to fetch signing keys: {0}")]
    KeySet(String),
}

/// Turns a bearer credential into a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the identity it asserts.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` if the token is malformed, expired, signed by an
    /// unknown key, issued for another project, or lacks an email claim.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
