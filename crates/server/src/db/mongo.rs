//! MongoDB habit store.
//!
//! The client is created on first use and shared by every request after
//! that. Initialization is single-flight: concurrent first requests wait on
//! one connection attempt, and a failed attempt leaves the handle empty so
//! the next request tries again.

use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, Database};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use habit_tracker_core::{CategoryFilter, HabitId};

use super::{DeleteAck, HabitStore, InsertAck, RepositoryError, UpdateAck};
use crate::config::MongoConfig;
use crate::models::{Habit, HabitQuery, HabitUpdate, NewHabit, utc_day_bounds};

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);
const APP_NAME: &str = "habit-tracker";

/// Habit document as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HabitDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reminder_time: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    creator_email: String,
    created_at: BsonDateTime,
    #[serde(default)]
    completion_history: Vec<BsonDateTime>,
}

impl HabitDocument {
    fn from_new(habit: &NewHabit, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: habit.title.clone(),
            description: Some(habit.description.clone()),
            category: Some(habit.category.clone()),
            reminder_time: habit.reminder_time.clone(),
            image: habit.image.clone(),
            creator_email: habit.creator_email.clone(),
            created_at: BsonDateTime::from_chrono(created_at),
            completion_history: Vec::new(),
        }
    }
}

impl TryFrom<HabitDocument> for Habit {
    type Error = RepositoryError;

    fn try_from(doc: HabitDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .ok_or_else(|| RepositoryError::DataCorruption("habit document without _id".into()))?;

        Ok(Self {
            id: HabitId::new(id.to_hex()),
            title: doc.title,
            description: doc.description.unwrap_or_default(),
            category: doc.category.unwrap_or_default(),
            reminder_time: doc.reminder_time,
            image: doc.image,
            creator_email: doc.creator_email,
            created_at: doc.created_at.to_chrono(),
            completion_history: doc
                .completion_history
                .into_iter()
                .map(BsonDateTime::to_chrono)
                .collect(),
        })
    }
}

/// [`HabitStore`] backed by a MongoDB collection.
pub struct MongoHabitStore {
    uri: Option<SecretString>,
    database: String,
    collection: String,
    db: OnceCell<Database>,
}

impl MongoHabitStore {
    /// Create a store that connects on first use.
    #[must_use]
    pub fn new(config: &MongoConfig) -> Self {
        Self {
            uri: config.uri.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            db: OnceCell::new(),
        }
    }

    /// Get the shared database handle, connecting if this is the first use.
    async fn database(&self) -> Result<&Database, RepositoryError> {
        self.db
            .get_or_try_init(|| async {
                self.connect().await.inspect_err(|e| {
                    error!(error = %e, "MongoDB connection failed");
                })
            })
            .await
    }

    async fn connect(&self) -> Result<Database, RepositoryError> {
        let uri = self.uri.as_ref().ok_or_else(|| {
            RepositoryError::Connection(
                "missing MongoDB connection info (set MONGODB_URI or DB_USER/DB_PASS/MONGODB_HOST)"
                    .into(),
            )
        })?;

        let mut options = ClientOptions::parse(uri.expose_secret())
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        options.app_name = Some(APP_NAME.to_string());
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client =
            Client::with_options(options).map_err(|e| RepositoryError::Connection(e.to_string()))?;
        let db = client.database(&self.database);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepositoryError::Connection(format!("ping failed: {e}")))?;

        info!(database = %self.database, "MongoDB connected");
        Ok(db)
    }

    async fn habits(&self) -> Result<Collection<HabitDocument>, RepositoryError> {
        Ok(self.database().await?.collection(&self.collection))
    }

    async fn collect(
        &self,
        cursor: mongodb::Cursor<HabitDocument>,
    ) -> Result<Vec<Habit>, RepositoryError> {
        let docs: Vec<HabitDocument> = cursor.try_collect().await?;
        docs.into_iter().map(Habit::try_from).collect()
    }
}

/// Parse a habit id into an object id. Anything else matches no document.
fn object_id(id: &HabitId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

/// Server-side filter equivalent to [`HabitQuery::matches`].
fn public_filter(query: &HabitQuery) -> Document {
    let mut filter = Document::new();

    if let CategoryFilter::Exact(category) = &query.category {
        filter.insert("category", category.as_str());
    }

    if let Some(pattern) = query.search_pattern() {
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    filter
}

/// Filter matching `oid` only when no completion falls on the UTC day of `at`.
fn not_completed_on_day_filter(oid: ObjectId, at: DateTime<Utc>) -> Document {
    let (start, end) = utc_day_bounds(at.date_naive());
    doc! {
        "_id": oid,
        "completionHistory": {
            "$not": {
                "$elemMatch": {
                    "$gte": BsonDateTime::from_chrono(start),
                    "$lt": BsonDateTime::from_chrono(end),
                }
            }
        }
    }
}

fn update_ack(result: &UpdateResult) -> UpdateAck {
    let upserted_id = result
        .upserted_id
        .as_ref()
        .and_then(Bson::as_object_id)
        .map(|oid| HabitId::new(oid.to_hex()));

    UpdateAck {
        acknowledged: true,
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_count: u64::from(upserted_id.is_some()),
        upserted_id,
    }
}

#[async_trait]
impl HabitStore for MongoHabitStore {
    #[instrument(skip_all)]
    async fn insert(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<InsertAck, RepositoryError> {
        let result = self
            .habits()
            .await?
            .insert_one(HabitDocument::from_new(habit, created_at))
            .await?;

        let inserted_id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| RepositoryError::DataCorruption("insert returned non-ObjectId _id".into()))?;

        Ok(InsertAck {
            acknowledged: true,
            inserted_id: HabitId::new(inserted_id.to_hex()),
        })
    }

    #[instrument(skip(self))]
    async fn most_recent(&self, limit: usize) -> Result<Vec<Habit>, RepositoryError> {
        let cursor = self
            .habits()
            .await?
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;
        self.collect(cursor).await
    }

    #[instrument(skip(self))]
    async fn find(&self, query: &HabitQuery) -> Result<Vec<Habit>, RepositoryError> {
        let cursor = self.habits().await?.find(public_filter(query)).await?;
        self.collect(cursor).await
    }

    #[instrument(skip(self))]
    async fn find_by_creator(&self, email: &str) -> Result<Vec<Habit>, RepositoryError> {
        let cursor = self
            .habits()
            .await?
            .find(doc! { "creatorEmail": email })
            .await?;
        self.collect(cursor).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &HabitId) -> Result<Option<Habit>, RepositoryError> {
        let Some(oid) = object_id(id) else {
            return Ok(None);
        };

        self.habits()
            .await?
            .find_one(doc! { "_id": oid })
            .await?
            .map(Habit::try_from)
            .transpose()
    }

    #[instrument(skip(self, update))]
    async fn update_fields(
        &self,
        id: &HabitId,
        update: &HabitUpdate,
    ) -> Result<UpdateAck, RepositoryError> {
        let Some(oid) = object_id(id) else {
            return Ok(UpdateAck::new(0, 0));
        };

        let set = doc! {
            "$set": {
                "title": update.title.as_str(),
                "description": update.description.as_str(),
                "category": update.category.as_str(),
                "reminderTime": update.reminder_time.clone(),
                "image": update.image.clone(),
            }
        };

        let result = self
            .habits()
            .await?
            .update_one(doc! { "_id": oid }, set)
            .await?;
        Ok(update_ack(&result))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &HabitId) -> Result<DeleteAck, RepositoryError> {
        let Some(oid) = object_id(id) else {
            return Ok(DeleteAck {
                acknowledged: true,
                deleted_count: 0,
            });
        };

        let result = self
            .habits()
            .await?
            .delete_one(doc! { "_id": oid })
            .await?;
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    #[instrument(skip(self))]
    async fn record_completion(
        &self,
        id: &HabitId,
        at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepositoryError> {
        let Some(oid) = object_id(id) else {
            return Ok(UpdateAck::new(0, 0));
        };

        let push = doc! { "$push": { "completionHistory": BsonDateTime::from_chrono(at) } };
        let result = self
            .habits()
            .await?
            .update_one(not_completed_on_day_filter(oid, at), push)
            .await?;
        Ok(update_ack(&result))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.database()
            .await?
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepositoryError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }
}
