//! Custom token minting for local testing.
//!
//! The printed token is exchanged with Firebase Auth
//! (`signInWithCustomToken`) for an ID token the server accepts.
//!
//! # Environment Variables
//!
//! - `FIREBASE_PROJECT_ID`, `FIREBASE_CLIENT_EMAIL`, `FIREBASE_PRIVATE_KEY`
//! - `FIREBASE_PRIVATE_KEY_ID` - Optional, sent as the token's `kid`

use habit_tracker_core::Email;
use habit_tracker_server::services::identity::{CustomTokenSigner, ServiceAccount};
use thiserror::Error;

/// Errors that can occur while minting a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("FIREBASE_PRIVATE_KEY not set")]
    NoServiceAccount,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] habit_tracker_core::EmailError),

    #[error(transparent)]
    Credential(#[from] habit_tracker_server::services::identity::CredentialError),
}

/// Mint a custom token for `uid` and print it to stdout.
///
/// # Errors
///
/// Returns `TokenError` if the service account is missing or invalid, the
/// email does not parse, or signing fails.
#[allow(clippy::print_stdout)]
pub fn mint(uid: &str, email: Option<&str>) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let account = ServiceAccount::from_env()?.ok_or(TokenError::NoServiceAccount)?;
    let email = email.map(Email::parse).transpose()?;

    let signer = CustomTokenSigner::new(&account)?;
    let token = signer.mint(uid, email.as_ref())?;

    tracing::info!(uid, client_email = %account.client_email, "Minted custom token (valid 1h)");
    println!("{token}");

    Ok(())
}
