//! Habit lifecycle service.
//!
//! Enforces who may create, change, remove and complete a habit. Reads are
//! open to anyone; writes take the caller's [`VerifiedIdentity`].

mod error;

pub use error::HabitError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use habit_tracker_core::HabitId;

use crate::db::{DeleteAck, HabitStore, InsertAck, UpdateAck};
use crate::models::{Habit, HabitQuery, HabitUpdate, NewHabit};
use crate::services::identity::VerifiedIdentity;

use error::{CANNOT_DELETE, CANNOT_EDIT, HABIT_NOT_FOUND, TOKEN_USER_MISMATCH};

/// Number of habits shown on the featured list.
pub const FEATURED_LIMIT: usize = 6;

const ALREADY_COMPLETED_MESSAGE: &str = "Habit already completed today.";

/// Body returned when today's completion is already recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlreadyCompleted {
    pub message: &'static str,
    pub acknowledged: bool,
}

impl Default for AlreadyCompleted {
    fn default() -> Self {
        Self {
            message: ALREADY_COMPLETED_MESSAGE,
            acknowledged: true,
        }
    }
}

/// Result of marking a habit complete. Both variants are successful responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CompletionOutcome {
    /// A new entry was appended.
    Recorded(UpdateAck),
    /// Today was already recorded; nothing changed.
    AlreadyCompleted(AlreadyCompleted),
}

/// Habit service.
pub struct HabitService<'a> {
    store: &'a dyn HabitStore,
}

impl<'a> HabitService<'a> {
    /// Create a new habit service over `store`.
    #[must_use]
    pub const fn new(store: &'a dyn HabitStore) -> Self {
        Self { store }
    }

    /// Create a habit owned by the acting identity.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::PermissionDenied` if `habit.creator_email` is not
    /// the caller's email.
    pub async fn create(
        &self,
        identity: &VerifiedIdentity,
        habit: &NewHabit,
    ) -> Result<InsertAck, HabitError> {
        self.create_at(identity, habit, Utc::now()).await
    }

    /// [`Self::create`] with an explicit creation time.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    #[instrument(skip_all, fields(email = %identity.email))]
    pub async fn create_at(
        &self,
        identity: &VerifiedIdentity,
        habit: &NewHabit,
        now: DateTime<Utc>,
    ) -> Result<InsertAck, HabitError> {
        if !identity.email.is(&habit.creator_email) {
            debug!(claimed = %habit.creator_email, "creator email does not match token");
            return Err(HabitError::PermissionDenied(TOKEN_USER_MISMATCH));
        }

        let ack = self.store.insert(habit, now).await?;
        info!(id = %ack.inserted_id, "habit created");
        Ok(ack)
    }

    /// The most recently created habits, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::Repository` if the store fails.
    pub async fn list_featured(&self) -> Result<Vec<Habit>, HabitError> {
        Ok(self.store.most_recent(FEATURED_LIMIT).await?)
    }

    /// Habits matching an optional category and search text.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::Repository` if the store fails.
    pub async fn list_public(&self, query: &HabitQuery) -> Result<Vec<Habit>, HabitError> {
        Ok(self.store.find(query).await?)
    }

    /// All habits created by `email`.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::Repository` if the store fails.
    pub async fn list_by_owner(&self, email: &str) -> Result<Vec<Habit>, HabitError> {
        Ok(self.store.find_by_creator(email).await?)
    }

    /// A single habit.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::NotFound` if no habit has this id.
    pub async fn get(&self, id: &HabitId) -> Result<Habit, HabitError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(HabitError::NotFound(HABIT_NOT_FOUND))
    }

    /// Replace the editable fields of a habit the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::PermissionDenied` if the habit is missing or owned
    /// by someone else.
    #[instrument(skip_all, fields(email = %identity.email, id = %id))]
    pub async fn update(
        &self,
        identity: &VerifiedIdentity,
        id: &HabitId,
        update: &HabitUpdate,
    ) -> Result<UpdateAck, HabitError> {
        self.require_owner(identity, id, CANNOT_EDIT).await?;

        let ack = self.store.update_fields(id, update).await?;
        info!(modified = ack.modified_count, "habit updated");
        Ok(ack)
    }

    /// Remove a habit the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::PermissionDenied` if the habit is missing or owned
    /// by someone else.
    #[instrument(skip_all, fields(email = %identity.email, id = %id))]
    pub async fn delete(
        &self,
        identity: &VerifiedIdentity,
        id: &HabitId,
    ) -> Result<DeleteAck, HabitError> {
        self.require_owner(identity, id, CANNOT_DELETE).await?;

        let ack = self.store.delete(id).await?;
        info!(deleted = ack.deleted_count, "habit deleted");
        Ok(ack)
    }

    /// Record today's (UTC) completion of a habit.
    ///
    /// Any authenticated caller may complete any habit.
    ///
    /// # Errors
    ///
    /// Returns `HabitError::NotFound` if no habit has this id.
    pub async fn complete_today(
        &self,
        identity: &VerifiedIdentity,
        id: &HabitId,
    ) -> Result<CompletionOutcome, HabitError> {
        self.complete_at(identity, id, Utc::now()).await
    }

    /// [`Self::complete_today`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`Self::complete_today`].
    #[instrument(skip_all, fields(email = %identity.email, id = %id))]
    pub async fn complete_at(
        &self,
        identity: &VerifiedIdentity,
        id: &HabitId,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, HabitError> {
        let ack = self.store.record_completion(id, now).await?;
        if ack.matched_count > 0 {
            info!("completion recorded");
            return Ok(CompletionOutcome::Recorded(ack));
        }

        // Nothing appended: either today is taken or the habit is gone.
        match self.store.find_by_id(id).await? {
            Some(_) => {
                debug!("already completed today");
                Ok(CompletionOutcome::AlreadyCompleted(AlreadyCompleted::default()))
            }
            None => Err(HabitError::NotFound(HABIT_NOT_FOUND)),
        }
    }

    async fn require_owner(
        &self,
        identity: &VerifiedIdentity,
        id: &HabitId,
        denial: &'static str,
    ) -> Result<Habit, HabitError> {
        match self.store.find_by_id(id).await? {
            Some(habit) if habit.is_owned_by(&identity.email) => Ok(habit),
            Some(habit) => {
                debug!(owner = %habit.creator_email, "caller does not own habit");
                Err(HabitError::PermissionDenied(denial))
            }
            None => Err(HabitError::PermissionDenied(denial)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use habit_tracker_core::Email;

    use super::*;
    use crate::db::InMemoryHabitStore;

    fn identity(email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            uid: format!("uid-{email}"),
            email: Email::parse(email).unwrap(),
        }
    }

    fn new_habit(title: &str, description: &str, category: &str, owner: &str) -> NewHabit {
        NewHabit {
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            reminder_time: Some("08:00".to_string()),
            image: None,
            creator_email: owner.to_string(),
        }
    }

    fn edit(title: &str) -> HabitUpdate {
        HabitUpdate {
            title: title.to_string(),
            description: "edited".to_string(),
            category: "Fitness".to_string(),
            reminder_time: None,
            image: Some("https://img.example/1.png".to_string()),
        }
    }

    async fn create(service: &HabitService<'_>, owner: &str, title: &str) -> HabitId {
        service
            .create(&identity(owner), &new_habit(title, "", "Health", owner))
            .await
            .unwrap()
            .inserted_id
    }

    #[tokio::test]
    async fn test_create_rejects_mismatched_creator() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);

        let result = service
            .create(&identity("u1@x.com"), &new_habit("Run", "", "Fitness", "u2@x.com"))
            .await;

        assert!(matches!(result, Err(HabitError::PermissionDenied(TOKEN_USER_MISMATCH))));
        assert!(service.list_featured().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let ack = service
            .create_at(&identity("u1@x.com"), &new_habit("Read", "", "Study", "u1@x.com"), now)
            .await
            .unwrap();
        assert!(ack.acknowledged);

        let habit = service.get(&ack.inserted_id).await.unwrap();
        assert_eq!(habit.title, "Read");
        assert_eq!(habit.created_at, now);
        assert!(habit.completion_history.is_empty());
        assert_eq!(habit.creator_email, "u1@x.com");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);

        assert!(matches!(
            service.get(&HabitId::from("nope")).await,
            Err(HabitError::NotFound(HABIT_NOT_FOUND))
        ));
    }

    #[tokio::test]
    async fn test_featured_limit_and_order() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let owner = identity("u1@x.com");
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        for i in 0..8 {
            service
                .create_at(
                    &owner,
                    &new_habit(&format!("h{i}"), "", "Health", "u1@x.com"),
                    start + Duration::hours(i),
                )
                .await
                .unwrap();
        }

        let featured = service.list_featured().await.unwrap();
        let titles: Vec<_> = featured.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, ["h7", "h6", "h5", "h4", "h3", "h2"]);
    }

    #[tokio::test]
    async fn test_featured_with_fewer_habits() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        create(&service, "u1@x.com", "only").await;

        assert_eq!(service.list_featured().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_public_filters() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let owner = identity("u1@x.com");
        for (title, description, category) in [
            ("Morning ABC drills", "", "Fitness"),
            ("Evening walk", "learn the abc of walking", "Fitness"),
            ("Journal", "write a page", "Mindfulness"),
            ("aBc flashcards", "", "Study"),
        ] {
            service
                .create(&owner, &new_habit(title, description, category, "u1@x.com"))
                .await
                .unwrap();
        }

        let search = service
            .list_public(&HabitQuery::new(None, Some("abc")))
            .await
            .unwrap();
        assert_eq!(search.len(), 3);

        let both = service
            .list_public(&HabitQuery::new(Some("Fitness"), Some("abc")))
            .await
            .unwrap();
        assert_eq!(both.len(), 2);

        let category_only = service
            .list_public(&HabitQuery::new(Some("Fitness"), Some("")))
            .await
            .unwrap();
        assert_eq!(category_only.len(), 2);

        let all = service
            .list_public(&HabitQuery::new(Some("All"), None))
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        create(&service, "u1@x.com", "a").await;
        create(&service, "u2@x.com", "b").await;
        create(&service, "u1@x.com", "c").await;

        let mine = service.list_by_owner("u1@x.com").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|h| h.creator_email == "u1@x.com"));
        assert!(service.list_by_owner("nobody@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_by_owner() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let id = create(&service, "u1@x.com", "Run").await;

        let ack = service
            .update(&identity("u1@x.com"), &id, &edit("Run far"))
            .await
            .unwrap();
        assert_eq!(ack.matched_count, 1);

        let habit = service.get(&id).await.unwrap();
        assert_eq!(habit.title, "Run far");
        assert_eq!(habit.category, "Fitness");
        assert_eq!(habit.reminder_time, None);
        assert_eq!(habit.creator_email, "u1@x.com");
    }

    #[tokio::test]
    async fn test_update_and_delete_denied_for_non_owner_and_missing() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let id = create(&service, "u1@x.com", "Run").await;
        let intruder = identity("u2@x.com");
        let missing = HabitId::from("000000000000000000000999");

        for target in [&id, &missing] {
            assert!(matches!(
                service.update(&intruder, target, &edit("mine now")).await,
                Err(HabitError::PermissionDenied(CANNOT_EDIT))
            ));
            assert!(matches!(
                service.delete(&intruder, target).await,
                Err(HabitError::PermissionDenied(CANNOT_DELETE))
            ));
        }

        assert_eq!(service.get(&id).await.unwrap().title, "Run");
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let id = create(&service, "u1@x.com", "Run").await;

        let ack = service.delete(&identity("u1@x.com"), &id).await.unwrap();
        assert_eq!(ack.deleted_count, 1);
        assert!(matches!(service.get(&id).await, Err(HabitError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_once_per_day() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);
        let id = create(&service, "u1@x.com", "Run").await;
        let other = identity("u2@x.com");
        let morning = Utc.with_ymd_and_hms(2025, 3, 1, 0, 5, 0).unwrap();

        let first = service.complete_at(&other, &id, morning).await.unwrap();
        assert!(matches!(first, CompletionOutcome::Recorded(ref ack) if ack.modified_count == 1));

        let second = service
            .complete_at(&other, &id, morning + Duration::hours(23))
            .await
            .unwrap();
        assert_eq!(second, CompletionOutcome::AlreadyCompleted(AlreadyCompleted::default()));

        let next_day = service
            .complete_at(&other, &id, morning + Duration::days(1))
            .await
            .unwrap();
        assert!(matches!(next_day, CompletionOutcome::Recorded(_)));

        assert_eq!(service.get(&id).await.unwrap().completion_history.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_missing() {
        let store = InMemoryHabitStore::new();
        let service = HabitService::new(&store);

        assert!(matches!(
            service
                .complete_today(&identity("u1@x.com"), &HabitId::from("missing"))
                .await,
            Err(HabitError::NotFound(HABIT_NOT_FOUND))
        ));
    }

    #[test]
    fn test_already_completed_body() {
        let body = serde_json::to_value(CompletionOutcome::AlreadyCompleted(
            AlreadyCompleted::default(),
        ))
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "Habit already completed today.", "acknowledged": true })
        );
    }
}
