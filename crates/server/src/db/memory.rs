//! Process-local habit store.
//!
//! Selected with `HABIT_STORE=memory` and used by the test suites. Every
//! operation runs under a single `RwLock`, so `record_completion` is atomic
//! with respect to concurrent requests in the same process.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use habit_tracker_core::HabitId;

use super::{DeleteAck, HabitStore, InsertAck, RepositoryError, UpdateAck};
use crate::models::{Habit, HabitQuery, HabitUpdate, NewHabit};

/// In-memory [`HabitStore`].
#[derive(Debug, Default)]
pub struct InMemoryHabitStore {
    habits: RwLock<Vec<Habit>>,
    next_id: AtomicU64,
}

impl InMemoryHabitStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex identifiers shaped like MongoDB object ids, unique per store.
    fn allocate_id(&self) -> HabitId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        HabitId::new(format!("{n:024x}"))
    }
}

#[async_trait]
impl HabitStore for InMemoryHabitStore {
    async fn insert(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<InsertAck, RepositoryError> {
        let id = self.allocate_id();
        let record = Habit {
            id: id.clone(),
            title: habit.title.clone(),
            description: habit.description.clone(),
            category: habit.category.clone(),
            reminder_time: habit.reminder_time.clone(),
            image: habit.image.clone(),
            creator_email: habit.creator_email.clone(),
            created_at,
            completion_history: Vec::new(),
        };

        self.habits.write().await.push(record);

        Ok(InsertAck {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn most_recent(&self, limit: usize) -> Result<Vec<Habit>, RepositoryError> {
        let mut habits = self.habits.read().await.clone();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        habits.truncate(limit);
        Ok(habits)
    }

    async fn find(&self, query: &HabitQuery) -> Result<Vec<Habit>, RepositoryError> {
        let habits = self.habits.read().await;
        Ok(habits.iter().filter(|h| query.matches(h)).cloned().collect())
    }

    async fn find_by_creator(&self, email: &str) -> Result<Vec<Habit>, RepositoryError> {
        let habits = self.habits.read().await;
        Ok(habits
            .iter()
            .filter(|h| h.creator_email == email)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &HabitId) -> Result<Option<Habit>, RepositoryError> {
        let habits = self.habits.read().await;
        Ok(habits.iter().find(|h| &h.id == id).cloned())
    }

    async fn update_fields(
        &self,
        id: &HabitId,
        update: &HabitUpdate,
    ) -> Result<UpdateAck, RepositoryError> {
        let mut habits = self.habits.write().await;
        let Some(habit) = habits.iter_mut().find(|h| &h.id == id) else {
            return Ok(UpdateAck::new(0, 0));
        };

        let before = habit.clone();
        habit.title.clone_from(&update.title);
        habit.description.clone_from(&update.description);
        habit.category.clone_from(&update.category);
        habit.reminder_time.clone_from(&update.reminder_time);
        habit.image.clone_from(&update.image);

        let modified = u64::from(*habit != before);
        Ok(UpdateAck::new(1, modified))
    }

    async fn delete(&self, id: &HabitId) -> Result<DeleteAck, RepositoryError> {
        let mut habits = self.habits.write().await;
        let before = habits.len();
        habits.retain(|h| &h.id != id);

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: u64::try_from(before - habits.len()).unwrap_or(u64::MAX),
        })
    }

    async fn record_completion(
        &self,
        id: &HabitId,
        at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepositoryError> {
        let mut habits = self.habits.write().await;
        match habits.iter_mut().find(|h| &h.id == id) {
            Some(habit) if !habit.completed_on(at.date_naive()) => {
                habit.completion_history.push(at);
                Ok(UpdateAck::new(1, 1))
            }
            _ => Ok(UpdateAck::new(0, 0)),
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
