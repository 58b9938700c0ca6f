//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_PROJECT_ID` - Firebase project whose ID tokens are accepted
//!
//! ## Optional
//! - `HABIT_TRACKER_HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `HABIT_STORE` - `mongo` or `memory` (default: mongo)
//! - `MONGODB_URI` - Full MongoDB connection string
//! - `DB_USER` / `DB_PASS` / `MONGODB_HOST` - Used to build the connection string
//!   when `MONGODB_URI` is not set
//! - `MONGODB_DB` - Database name (default: habittrackerDB)
//! - `MONGODB_COLLECTION` - Collection name (default: habits)
//! - `FIREBASE_PRIVATE_KEY`, `FIREBASE_CLIENT_EMAIL`, `FIREBASE_PRIVATE_KEY_ID`,
//!   `FIREBASE_CLIENT_ID` - Service account (see [`ServiceAccount::from_env`])
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)
//!
//! Missing MongoDB connection info is not fatal: the server starts and
//! store-backed routes fail until it is provided.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::identity::{CredentialError, ServiceAccount};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid service account: {0}")]
    Credential(#[from] CredentialError),
}

/// Which habit store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}' (expected mongo or memory)")),
        }
    }
}

/// Habit tracker server configuration.
#[derive(Debug, Clone)]
pub struct HabitServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Store backend
    pub store: StoreBackend,
    /// MongoDB settings (used by the `mongo` backend)
    pub mongo: MongoConfig,
    /// Firebase identity settings
    pub firebase: FirebaseConfig,
    /// Sentry error tracking settings
    pub sentry: SentryConfig,
}

/// MongoDB connection settings.
///
/// Implements `Debug` manually to redact the connection string.
#[derive(Clone)]
pub struct MongoConfig {
    /// Connection string (contains credentials). `None` when not configured.
    pub uri: Option<SecretString>,
    /// Database name
    pub database: String,
    /// Habit collection name
    pub collection: String,
}

impl std::fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &self.uri.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

/// Firebase identity settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Project id; ID tokens must name it as audience.
    pub project_id: String,
    /// Service account, when key material is configured.
    pub service_account: Option<ServiceAccount>,
}

/// Sentry error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl HabitServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if configured service account key material cannot be normalized.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("HABIT_TRACKER_HOST", "127.0.0.1")?;
        let port = parse_env("PORT", "5000")?;
        let store = parse_env("HABIT_STORE", "mongo")?;

        Ok(Self {
            host,
            port,
            store,
            mongo: MongoConfig::from_env()?,
            firebase: FirebaseConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MongoConfig {
    /// Load MongoDB settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `DB_USER`/`DB_PASS` are set
    /// without `MONGODB_HOST`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let uri = match get_optional_env("MONGODB_URI") {
            Some(uri) => Some(SecretString::from(uri)),
            None => match (get_optional_env("DB_USER"), get_optional_env("DB_PASS")) {
                (Some(user), Some(pass)) => {
                    let host = get_required_env("MONGODB_HOST")?;
                    Some(SecretString::from(build_mongo_uri(&user, &pass, &host)))
                }
                _ => None,
            },
        };

        Ok(Self {
            uri,
            database: get_env_or_default("MONGODB_DB", "habittrackerDB"),
            collection: get_env_or_default("MONGODB_COLLECTION", "habits"),
        })
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            service_account: ServiceAccount::from_env()?,
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

/// Build an SRV connection string with percent-encoded credentials.
#[must_use]
pub fn build_mongo_uri(user: &str, pass: &str, host: &str) -> String {
    format!(
        "mongodb+srv://{}:{}@{host}/?retryWrites=true&w=majority",
        urlencoding::encode(user),
        urlencoding::encode(pass),
    )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
