//! Habit service error types.

use thiserror::Error;

use crate::db::RepositoryError;

pub(super) const TOKEN_USER_MISMATCH: &str = "Token user mismatch.";
pub(super) const CANNOT_EDIT: &str = "You do not have permission to edit this habit.";
pub(super) const CANNOT_DELETE: &str = "You do not have permission to delete this habit.";
pub(super) const HABIT_NOT_FOUND: &str = "Habit not found.";

/// Errors that can occur during habit operations.
#[derive(Debug, Error)]
pub enum HabitError {
    /// The acting identity may not perform this operation.
    ///
    /// Update and delete report a missing habit this way too, so callers
    /// cannot discover ids they do not own.
    #[error("{0}")]
    PermissionDenied(&'static str),

    /// No habit with the requested id.
    #[error("{0}")]
    NotFound(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
