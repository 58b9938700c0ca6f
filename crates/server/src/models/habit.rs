//! Habit records and the request payloads that create or change them.
//!
//! JSON field names follow the document shape clients already consume:
//! camelCase attributes and the store identifier under `_id`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use habit_tracker_core::{CategoryFilter, Email, HabitId};

/// A recurring activity tracked by one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: HabitId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Schedule hint, opaque to the server.
    pub reminder_time: Option<String>,
    /// Image URL or blob reference.
    pub image: Option<String>,
    /// Email of the identity that created the habit. Never changed after insert.
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    /// One entry per UTC day the habit was completed, in insertion order.
    pub completion_history: Vec<DateTime<Utc>>,
}

impl Habit {
    /// Whether `identity` owns this habit.
    #[must_use]
    pub fn is_owned_by(&self, identity: &Email) -> bool {
        identity.is(&self.creator_email)
    }

    /// Whether the completion history already has an entry on `day` (UTC).
    #[must_use]
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.completion_history
            .iter()
            .any(|completed| completed.date_naive() == day)
    }
}

/// Body of `POST /add-habit`.
///
/// Every field is optional on the wire so the ownership check always runs
/// first. `creatorEmail` is kept as a raw string: it is compared against the
/// authenticated identity, and any mismatch (including a missing or
/// malformed value) is a permission failure rather than a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub creator_email: String,
}

/// Body of `PUT /update-habit/{id}`.
///
/// These are the only fields an owner may change. Fields left out of the
/// body are cleared.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Filter for the public habit listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitQuery {
    pub category: CategoryFilter,
    /// Literal text matched case-insensitively against title or description.
    /// Never empty; an empty search means no text restriction.
    pub search: Option<String>,
}

impl HabitQuery {
    /// Build a query from the raw `category` and `search` parameters.
    #[must_use]
    pub fn new(category: Option<&str>, search: Option<&str>) -> Self {
        Self {
            category: CategoryFilter::from_query(category),
            search: search.filter(|s| !s.is_empty()).map(str::to_owned),
        }
    }

    /// The search text as an escaped regular expression, if any.
    ///
    /// MongoDB receives this pattern with the `i` option; [`Self::matches`]
    /// compiles the same pattern case-insensitively.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(regex::escape)
    }

    /// Evaluate the query against a habit in memory.
    #[must_use]
    pub fn matches(&self, habit: &Habit) -> bool {
        if !self.category.matches(&habit.category) {
            return false;
        }

        let Some(pattern) = self.search_pattern() else {
            return true;
        };
        // An escaped literal always compiles.
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .is_ok_and(|re| re.is_match(&habit.title) || re.is_match(&habit.description))
    }
}

/// Half-open `[start, end)` instants covering `day` in UTC.
#[must_use]
pub fn utc_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + TimeDelta::days(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn habit(title: &str, description: &str, category: &str) -> Habit {
        Habit {
            id: HabitId::new("1"),
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            reminder_time: None,
            image: None,
            creator_email: "u1@x.com".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap(),
            completion_history: Vec::new(),
        }
    }

    #[test]
    fn test_completed_on_uses_utc_date() {
        let mut h = habit("Run", "", "Fitness");
        h.completion_history
            .push(Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap());

        assert!(h.completed_on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()));
        assert!(!h.completed_on(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
    }

    #[test]
    fn test_is_owned_by() {
        let h = habit("Run", "", "Fitness");
        assert!(h.is_owned_by(&Email::parse("u1@x.com").unwrap()));
        assert!(!h.is_owned_by(&Email::parse("u2@x.com").unwrap()));
    }

    #[test]
    fn test_query_search_is_case_insensitive_over_title_or_description() {
        let query = HabitQuery::new(None, Some("ABC"));
        assert!(query.matches(&habit("xabcx", "", "Fitness")));
        assert!(query.matches(&habit("Read", "the AbC book", "Study")));
        assert!(!query.matches(&habit("Read", "nothing here", "Study")));
    }

    #[test]
    fn test_query_combines_category_and_search() {
        let query = HabitQuery::new(Some("Study"), Some("read"));
        assert!(query.matches(&habit("Read", "", "Study")));
        assert!(!query.matches(&habit("Read", "", "Fitness")));
        assert!(!query.matches(&habit("Walk", "", "Study")));
    }

    #[test]
    fn test_empty_search_is_no_restriction() {
        let query = HabitQuery::new(Some("All"), Some(""));
        assert_eq!(query, HabitQuery::default());
        assert!(query.matches(&habit("anything", "", "Other")));
    }

    #[test]
    fn test_utc_day_bounds() {
        let (start, end) = utc_day_bounds(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_habit_serializes_document_shape() {
        let json = serde_json::to_value(habit("Run", "daily", "Fitness")).unwrap();
        assert_eq!(json["_id"], "1");
        assert_eq!(json["creatorEmail"], "u1@x.com");
        assert_eq!(json["completionHistory"], serde_json::json!([]));
        assert!(json["reminderTime"].is_null());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_new_habit_defaults_optional_fields() {
        let payload: NewHabit = serde_json::from_value(serde_json::json!({
            "title": "Run",
            "category": "Fitness",
            "creatorEmail": "u1@x.com"
        }))
        .unwrap();
        assert_eq!(payload.description, "");
        assert_eq!(payload.reminder_time, None);
        assert_eq!(payload.image, None);
    }

    #[test]
    fn test_query_search_is_literal() {
        let query = HabitQuery::new(None, Some("(A+B)"));
        assert!(query.matches(&habit("Stretch (a+b)", "", "Fitness")));
        assert!(!query.matches(&habit("Stretch aab", "", "Fitness")));
        assert_eq!(query.search_pattern().as_deref(), Some(r"\(A\+B\)"));
    }

    #[test]
    fn test_query_search_folds_non_ascii_case() {
        let query = HabitQuery::new(None, Some("σοφία"));
        assert!(query.matches(&habit("ΣΟΦΊΑ daily", "", "Study")));
    }

    #[test]
    fn test_new_habit_accepts_sparse_body() {
        let payload: NewHabit =
            serde_json::from_value(serde_json::json!({ "creatorEmail": "u2@x.com" })).unwrap();
        assert_eq!(payload.title, "");
        assert_eq!(payload.creator_email, "u2@x.com");

        let empty: NewHabit = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty.creator_email, "");
    }

    #[test]
    fn test_habit_update_accepts_partial_body() {
        let update: HabitUpdate =
            serde_json::from_value(serde_json::json!({ "description": "x" })).unwrap();
        assert_eq!(update.title, "");
        assert_eq!(update.category, "");
        assert_eq!(update.description, "x");
    }
}
