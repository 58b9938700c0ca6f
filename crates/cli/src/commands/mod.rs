//! CLI subcommands.

pub mod credentials;
pub mod seed;
pub mod token;
