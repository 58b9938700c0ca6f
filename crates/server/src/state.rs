//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{HabitServerConfig, StoreBackend};
use crate::db::{HabitStore, InMemoryHabitStore, MongoHabitStore};
use crate::services::HabitService;
use crate::services::identity::{FirebaseVerifier, IdentityVerifier};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the one process-wide store handle and
/// the identity verifier.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn HabitStore>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Create state from explicit collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn HabitStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, verifier }),
        }
    }

    /// Build the configured store backend and a Firebase verifier.
    ///
    /// The MongoDB backend does not connect here; it connects on first use.
    #[must_use]
    pub fn from_config(config: &HabitServerConfig) -> Self {
        let store: Arc<dyn HabitStore> = match config.store {
            StoreBackend::Mongo => Arc::new(MongoHabitStore::new(&config.mongo)),
            StoreBackend::Memory => Arc::new(InMemoryHabitStore::new()),
        };
        let verifier = Arc::new(FirebaseVerifier::new(config.firebase.project_id.clone()));

        Self::new(store, verifier)
    }

    /// Get a reference to the habit store.
    #[must_use]
    pub fn store(&self) -> &dyn HabitStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the identity verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.inner.verifier.as_ref()
    }

    /// Habit service over the shared store.
    #[must_use]
    pub fn habits(&self) -> HabitService<'_> {
        HabitService::new(self.store())
    }
}
