//! Service account key checks.
//!
//! # Environment Variables
//!
//! - `FIREBASE_PRIVATE_KEY` - PEM, PEM with escaped `\n`, or base64-encoded PEM
//! - `FIREBASE_CLIENT_EMAIL` - Service account email (optional here)
//!
//! Only lengths and header presence are reported, never key material.

use tracing::info;

use habit_tracker_server::services::identity::{CredentialError, normalize_private_key};

const PEM_HEADER: &str = "-----BEGIN";

/// What the raw key looked like and what it normalized to.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyReport {
    pub raw_len: usize,
    pub raw_has_header: bool,
    pub normalized_len: usize,
    pub normalized_lines: usize,
}

/// Normalize `raw` and describe the result without exposing it.
///
/// # Errors
///
/// Returns `CredentialError` if the key cannot be normalized.
pub fn inspect(raw: &str) -> Result<KeyReport, CredentialError> {
    let normalized = normalize_private_key(raw)?;

    Ok(KeyReport {
        raw_len: raw.len(),
        raw_has_header: raw.contains(PEM_HEADER),
        normalized_len: normalized.len(),
        normalized_lines: normalized.lines().count(),
    })
}

/// Check `FIREBASE_PRIVATE_KEY` from the environment.
///
/// # Errors
///
/// Returns an error if the variable is unset or the key cannot be normalized.
pub fn check() -> Result<(), CredentialError> {
    dotenvy::dotenv().ok();

    let raw = std::env::var("FIREBASE_PRIVATE_KEY")
        .map_err(|_| CredentialError::MissingEnvVar("FIREBASE_PRIVATE_KEY".to_string()))?;

    let report = inspect(&raw)?;

    info!(
        raw_len = report.raw_len,
        raw_has_header = report.raw_has_header,
        "Raw private key"
    );
    info!(
        normalized_len = report.normalized_len,
        lines = report.normalized_lines,
        "Private key normalized to PEM and parsed as RSA"
    );

    match std::env::var("FIREBASE_CLIENT_EMAIL") {
        Ok(email) => info!(client_email = %email, "Service account email set"),
        Err(_) => info!("FIREBASE_CLIENT_EMAIL not set; token minting will fail"),
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_KEY: &str =
        include_str!("../../../server/tests/fixtures/test_service_account_key.pem");

    #[test]
    fn test_inspect_escaped_key() {
        let escaped = TEST_KEY.trim_end().replace('\n', "\\n");
        let report = inspect(&escaped).unwrap();

        assert!(report.raw_has_header);
        assert_eq!(report.normalized_len, TEST_KEY.len());
        assert_eq!(report.normalized_lines, TEST_KEY.lines().count());
    }

    #[test]
    fn test_inspect_rejects_empty() {
        assert!(matches!(inspect("  "), Err(CredentialError::EmptyKey)));
    }
}
