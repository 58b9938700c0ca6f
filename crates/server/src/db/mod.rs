//! Habit persistence.
//!
//! # Collection: `habits`
//!
//! One document per habit. Shape (camelCase, as clients see it):
//!
//! - `_id` - store-assigned identifier
//! - `title`, `description`, `category`, `reminderTime`, `image`
//! - `creatorEmail` - owner, set once at insert
//! - `createdAt` - insert timestamp
//! - `completionHistory` - array of timestamps, at most one per UTC day
//!
//! # Backends
//!
//! - [`mongo::MongoHabitStore`] - MongoDB, connected lazily on first use
//! - [`memory::InMemoryHabitStore`] - process-local, for tests and local runs
//!
//! Both implement [`HabitStore`]. The store is the only arbiter of concurrent
//! writes; callers hold no locks across store calls.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use habit_tracker_core::HabitId;

use crate::models::{Habit, HabitQuery, HabitUpdate, NewHabit};

pub use memory::InMemoryHabitStore;
pub use mongo::MongoHabitStore;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached or is not configured.
    #[error("database connection error: {0}")]
    Connection(String),

    /// Database error from the MongoDB driver.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Acknowledgment of an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: HabitId,
}

/// Acknowledgment of a single-document update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<HabitId>,
}

impl UpdateAck {
    /// An acknowledged update that touched `matched` documents and changed `modified`.
    #[must_use]
    pub const fn new(matched: u64, modified: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count: matched,
            modified_count: modified,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

/// Acknowledgment of a single-document delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Document store for habit records.
///
/// Identifiers the backend cannot interpret match no record: lookups return
/// `None` and writes report zero matched documents.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Persist a new habit created at `created_at` with an empty completion history.
    async fn insert(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<InsertAck, RepositoryError>;

    /// The `limit` most recently created habits, newest first.
    async fn most_recent(&self, limit: usize) -> Result<Vec<Habit>, RepositoryError>;

    /// All habits matching `query`.
    async fn find(&self, query: &HabitQuery) -> Result<Vec<Habit>, RepositoryError>;

    /// All habits whose `creatorEmail` equals `email`.
    async fn find_by_creator(&self, email: &str) -> Result<Vec<Habit>, RepositoryError>;

    /// The habit with this identifier, if any.
    async fn find_by_id(&self, id: &HabitId) -> Result<Option<Habit>, RepositoryError>;

    /// Replace the owner-editable fields of a habit.
    async fn update_fields(
        &self,
        id: &HabitId,
        update: &HabitUpdate,
    ) -> Result<UpdateAck, RepositoryError>;

    /// Remove a habit.
    async fn delete(&self, id: &HabitId) -> Result<DeleteAck, RepositoryError>;

    /// Append `at` to the completion history unless it already holds an entry
    /// on the same UTC day.
    ///
    /// The check and the append are a single atomic step. A result with
    /// `matched_count == 0` means nothing was appended: either the habit does
    /// not exist or that day is already recorded.
    async fn record_completion(
        &self,
        id: &HabitId,
        at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
