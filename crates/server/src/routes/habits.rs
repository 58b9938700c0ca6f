//! Habit route handlers.

use axum::extract::State;
use serde::Deserialize;

use habit_tracker_core::HabitId;

use crate::db::{DeleteAck, InsertAck, UpdateAck};
use crate::error::Result;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::RequireIdentity;
use crate::models::{Habit, HabitQuery, HabitUpdate, NewHabit};
use crate::services::CompletionOutcome;
use crate::state::AppState;

const LIVENESS_TEXT: &str = "Habit Tracker Server is running and connected!";

/// Query parameters for `GET /public-habits`.
#[derive(Debug, Default, Deserialize)]
pub struct PublicHabitsParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// `GET /`
pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

/// `GET /featured-habits`
pub async fn featured(State(state): State<AppState>) -> Result<AppJson<Vec<Habit>>> {
    Ok(AppJson(state.habits().list_featured().await?))
}

/// `GET /public-habits?category=&search=`
pub async fn public(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PublicHabitsParams>,
) -> Result<AppJson<Vec<Habit>>> {
    let query = HabitQuery::new(params.category.as_deref(), params.search.as_deref());
    Ok(AppJson(state.habits().list_public(&query).await?))
}

/// `GET /my-habits/{email}`
pub async fn by_owner(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> Result<AppJson<Vec<Habit>>> {
    Ok(AppJson(state.habits().list_by_owner(&email).await?))
}

/// `GET /habit/{id}`
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<HabitId>,
) -> Result<AppJson<Habit>> {
    Ok(AppJson(state.habits().get(&id).await?))
}

/// `POST /add-habit`
pub async fn add(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    AppJson(habit): AppJson<NewHabit>,
) -> Result<AppJson<InsertAck>> {
    Ok(AppJson(state.habits().create(&identity, &habit).await?))
}

/// `PUT /update-habit/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    AppPath(id): AppPath<HabitId>,
    AppJson(update): AppJson<HabitUpdate>,
) -> Result<AppJson<UpdateAck>> {
    Ok(AppJson(state.habits().update(&identity, &id, &update).await?))
}

/// `DELETE /habit/{id}`
pub async fn remove(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    AppPath(id): AppPath<HabitId>,
) -> Result<AppJson<DeleteAck>> {
    Ok(AppJson(state.habits().delete(&identity, &id).await?))
}

/// `PATCH /habit/complete/{id}`
///
/// Answers 200 both when a completion is recorded and when today is
/// already recorded.
pub async fn complete(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    AppPath(id): AppPath<HabitId>,
) -> Result<AppJson<CompletionOutcome>> {
    Ok(AppJson(state.habits().complete_today(&identity, &id).await?))
}
