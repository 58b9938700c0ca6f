//! Business logic services.
//!
//! - [`habits`] - Ownership-gated habit lifecycle
//! - [`identity`] - Bearer credential verification and service account key material

pub mod habits;
pub mod identity;

pub use habits::{CompletionOutcome, HabitError, HabitService};
pub use identity::{IdentityVerifier, VerifiedIdentity, VerifyError};
