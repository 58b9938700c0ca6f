//! Habit Tracker Core - Shared types library.
//!
//! This crate provides common types used across the habit tracker components:
//! - `server` - HTTP API for habits
//! - `cli` - Operator tools (credential checks, token minting, seeding)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, habit identifiers, and category filters

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
