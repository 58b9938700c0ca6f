//! Seed the habit store from a YAML file.
//!
//! Every entry goes through the habit service as if its `creatorEmail` had
//! created it, so seeded records get `createdAt` and an empty completion
//! history exactly like API-created ones.
//!
//! # File format
//!
//! ```yaml
//! habits:
//!   - title: Morning run
//!     description: 5k around the park
//!     category: Fitness
//!     reminderTime: "07:00"
//!     creatorEmail: runner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `HABIT_STORE` - `mongo` (default) or `memory`
//! - `MONGODB_URI` or `DB_USER`/`DB_PASS`/`MONGODB_HOST`
//! - `MONGODB_DB`, `MONGODB_COLLECTION`

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use habit_tracker_core::{Email, EmailError};
use habit_tracker_server::config::{MongoConfig, StoreBackend};
use habit_tracker_server::db::{HabitStore, InMemoryHabitStore, MongoHabitStore};
use habit_tracker_server::models::NewHabit;
use habit_tracker_server::services::{HabitError, HabitService, VerifiedIdentity};

/// Contents of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub habits: Vec<NewHabit>,
}

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Entry {index} ({title}): invalid creatorEmail: {source}")]
    InvalidOwner {
        index: usize,
        title: String,
        source: EmailError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Entry {index} ({title}): {source}")]
    Insert {
        index: usize,
        title: String,
        source: HabitError,
    },
}

/// Check every entry has a well-formed owner email.
///
/// # Errors
///
/// Returns `SeedError::InvalidOwner` for the first bad entry.
pub fn validate(file: &SeedFile) -> Result<(), SeedError> {
    for (index, habit) in file.habits.iter().enumerate() {
        Email::parse(&habit.creator_email).map_err(|source| SeedError::InvalidOwner {
            index,
            title: habit.title.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Insert every entry through the habit service. Returns the number inserted.
///
/// # Errors
///
/// Returns `SeedError` for the first entry that fails; earlier entries stay
/// inserted.
pub async fn insert_all(store: &dyn HabitStore, file: &SeedFile) -> Result<usize, SeedError> {
    let service = HabitService::new(store);

    for (index, habit) in file.habits.iter().enumerate() {
        let email = Email::parse(&habit.creator_email).map_err(|source| {
            SeedError::InvalidOwner {
                index,
                title: habit.title.clone(),
                source,
            }
        })?;
        let owner = VerifiedIdentity {
            uid: format!("seed:{email}"),
            email,
        };

        let ack = service
            .create(&owner, habit)
            .await
            .map_err(|source| SeedError::Insert {
                index,
                title: habit.title.clone(),
                source,
            })?;
        info!(id = %ack.inserted_id, title = %habit.title, "Inserted habit");
    }

    Ok(file.habits.len())
}

/// Seed habits from `file_path`.
///
/// # Errors
///
/// Returns `SeedError` if the file is missing or invalid, the store is
/// misconfigured, or an insert fails.
pub async fn habits(file_path: &str, dry_run: bool) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading habits from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(habits = file.habits.len(), "Parsed seed file");

    // Validate everything before touching the store
    if let Err(e) = validate(&file) {
        error!("Seed file validation failed: {e}");
        return Err(e);
    }

    if dry_run {
        info!("Dry run: seed file is valid, nothing written");
        return Ok(());
    }

    let backend: StoreBackend = std::env::var("HABIT_STORE")
        .ok()
        .filter(|s| !s.is_empty())
        .map_or(Ok(StoreBackend::Mongo), |s| s.parse())
        .map_err(SeedError::Config)?;

    let inserted = match backend {
        StoreBackend::Mongo => {
            let config = MongoConfig::from_env().map_err(|e| SeedError::Config(e.to_string()))?;
            info!(database = %config.database, collection = %config.collection, "Seeding MongoDB");
            insert_all(&MongoHabitStore::new(&config), &file).await?
        }
        StoreBackend::Memory => {
            info!("Seeding an in-memory store; records are discarded on exit");
            insert_all(&InMemoryHabitStore::new(), &file).await?
        }
    };

    info!("Seeding complete!");
    info!("  Habits inserted: {inserted}");

    Ok(())
}
