//! Habit tracker server library.
//!
//! Ownership-gated CRUD over habits with a once-per-UTC-day completion rule.
//! Exposed as a library so the CLI and the integration tests can drive the
//! same services and router as the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
