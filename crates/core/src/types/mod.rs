//! Core types for the habit tracker.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;

pub use category::CategoryFilter;
pub use email::{Email, EmailError};
pub use id::HabitId;
