//! Store traits and MongoDB implementations
//!
//! Traits allow swapping implementations (in-memory for tests, MongoDB
//! for production) without touching the lifecycle or tracking logic.

use bson::{doc, oid::ObjectId, DateTime, Document};

use crate::db::{
    Frequency, HabitDoc, MongoClient, MongoCollection, TrackingLogDoc, HABIT_COLLECTION,
    TRACKING_LOG_COLLECTION,
};
use crate::types::Result;

/// Partial update applied to a habit. A `Some` field overwrites the
/// stored value, `None` leaves it unchanged; sending an empty value
/// (e.g. `[]` for tags) clears the field.
#[derive(Debug, Clone, Default)]
pub struct HabitUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub tags: Option<Vec<String>>,
    pub reminder_time: Option<String>,
}

/// Owner-scoped habit persistence
#[async_trait::async_trait]
pub trait HabitStore: Send + Sync {
    /// Insert a habit and return its id
    async fn insert(&self, habit: HabitDoc) -> Result<ObjectId>;

    /// Fetch a habit by id
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<HabitDoc>>;

    /// Count habits owned by `owner`, optionally restricted to a tag
    async fn count_for_owner(&self, owner: ObjectId, tag: Option<&str>) -> Result<u64>;

    /// One page of habits owned by `owner`, optionally restricted to a tag
    async fn list_for_owner(
        &self,
        owner: ObjectId,
        tag: Option<&str>,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<HabitDoc>>;

    /// Apply a partial field update
    async fn update_fields(&self, id: ObjectId, update: &HabitUpdate) -> Result<()>;

    /// Write the derived streak state
    async fn save_streak(&self, id: ObjectId, streak: i32, longest_streak: i32) -> Result<()>;

    /// Remove a habit. Tracking logs are not touched.
    async fn remove(&self, id: ObjectId) -> Result<()>;
}

/// Append-only tracking log persistence
#[async_trait::async_trait]
pub trait TrackingLogStore: Send + Sync {
    /// Fetch the log for one habit on one normalized day, if any
    async fn find_on_day(&self, habit: ObjectId, day: DateTime) -> Result<Option<TrackingLogDoc>>;

    /// Insert a log. A duplicate `(habit, date)` pair must fail with the
    /// storage layer's uniqueness violation.
    async fn insert(&self, log: TrackingLogDoc) -> Result<TrackingLogDoc>;

    /// All logs for a habit with `date >= cutoff`, newest first
    async fn find_since(&self, habit: ObjectId, cutoff: DateTime) -> Result<Vec<TrackingLogDoc>>;
}

// =============================================================================
// MongoDB implementations
// =============================================================================

/// MongoDB-backed habit store
pub struct MongoHabitStore {
    collection: MongoCollection<HabitDoc>,
}

impl MongoHabitStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo.collection::<HabitDoc>(HABIT_COLLECTION).await?,
        })
    }

    fn owner_filter(owner: ObjectId, tag: Option<&str>) -> Document {
        match tag {
            // Mongo matches array fields by containment
            Some(tag) => doc! { "user": owner, "tags": tag },
            None => doc! { "user": owner },
        }
    }
}

#[async_trait::async_trait]
impl HabitStore for MongoHabitStore {
    async fn insert(&self, habit: HabitDoc) -> Result<ObjectId> {
        self.collection.insert_one(habit).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<HabitDoc>> {
        self.collection.find_one(doc! { "_id": id }).await
    }

    async fn count_for_owner(&self, owner: ObjectId, tag: Option<&str>) -> Result<u64> {
        self.collection.count(Self::owner_filter(owner, tag)).await
    }

    async fn list_for_owner(
        &self,
        owner: ObjectId,
        tag: Option<&str>,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<HabitDoc>> {
        self.collection
            .find_page(
                Self::owner_filter(owner, tag),
                doc! { "metadata.created_at": 1 },
                skip,
                limit,
            )
            .await
    }

    async fn update_fields(&self, id: ObjectId, update: &HabitUpdate) -> Result<()> {
        let mut set = Document::new();
        if let Some(title) = &update.title {
            set.insert("title", title.clone());
        }
        if let Some(description) = &update.description {
            set.insert("description", description.clone());
        }
        if let Some(frequency) = update.frequency {
            set.insert("frequency", frequency.to_string());
        }
        if let Some(tags) = &update.tags {
            set.insert("tags", tags.clone());
        }
        if let Some(reminder_time) = &update.reminder_time {
            set.insert("reminder_time", reminder_time.clone());
        }
        set.insert("metadata.updated_at", DateTime::now());

        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(())
    }

    async fn save_streak(&self, id: ObjectId, streak: i32, longest_streak: i32) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "streak": streak,
                    "longest_streak": longest_streak,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, id: ObjectId) -> Result<()> {
        self.collection.soft_delete(doc! { "_id": id }).await?;
        Ok(())
    }
}

/// MongoDB-backed tracking log store
pub struct MongoTrackingLogStore {
    collection: MongoCollection<TrackingLogDoc>,
}

impl MongoTrackingLogStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo
                .collection::<TrackingLogDoc>(TRACKING_LOG_COLLECTION)
                .await?,
        })
    }
}

#[async_trait::async_trait]
impl TrackingLogStore for MongoTrackingLogStore {
    async fn find_on_day(&self, habit: ObjectId, day: DateTime) -> Result<Option<TrackingLogDoc>> {
        self.collection
            .find_one(doc! { "habit": habit, "date": day })
            .await
    }

    async fn insert(&self, log: TrackingLogDoc) -> Result<TrackingLogDoc> {
        let mut log = log;
        let id = self.collection.insert_one(log.clone()).await?;
        log._id = Some(id);
        Ok(log)
    }

    async fn find_since(&self, habit: ObjectId, cutoff: DateTime) -> Result<Vec<TrackingLogDoc>> {
        self.collection
            .find_sorted(
                doc! { "habit": habit, "date": { "$gte": cutoff } },
                doc! { "date": -1 },
            )
            .await
    }
}

// =============================================================================
// In-memory implementations for tests
// =============================================================================

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;
    use crate::types::CadenceError;

    /// In-memory habit store, insertion-ordered like an un-sorted Mongo scan
    #[derive(Default)]
    pub struct MemoryHabitStore {
        habits: Mutex<Vec<HabitDoc>>,
    }

    impl MemoryHabitStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn matches(habit: &HabitDoc, owner: ObjectId, tag: Option<&str>) -> bool {
        habit.user == owner
            && !habit.metadata.is_deleted
            && tag.map_or(true, |t| habit.tags.iter().any(|have| have == t))
    }

    #[async_trait::async_trait]
    impl HabitStore for MemoryHabitStore {
        async fn insert(&self, mut habit: HabitDoc) -> Result<ObjectId> {
            let id = ObjectId::new();
            habit._id = Some(id);
            self.habits.lock().unwrap().push(habit);
            Ok(id)
        }

        async fn find_by_id(&self, id: ObjectId) -> Result<Option<HabitDoc>> {
            Ok(self
                .habits
                .lock()
                .unwrap()
                .iter()
                .find(|h| h._id == Some(id) && !h.metadata.is_deleted)
                .cloned())
        }

        async fn count_for_owner(&self, owner: ObjectId, tag: Option<&str>) -> Result<u64> {
            Ok(self
                .habits
                .lock()
                .unwrap()
                .iter()
                .filter(|h| matches(h, owner, tag))
                .count() as u64)
        }

        async fn list_for_owner(
            &self,
            owner: ObjectId,
            tag: Option<&str>,
            skip: u64,
            limit: i64,
        ) -> Result<Vec<HabitDoc>> {
            Ok(self
                .habits
                .lock()
                .unwrap()
                .iter()
                .filter(|h| matches(h, owner, tag))
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn update_fields(&self, id: ObjectId, update: &HabitUpdate) -> Result<()> {
            let mut habits = self.habits.lock().unwrap();
            if let Some(habit) = habits.iter_mut().find(|h| h._id == Some(id)) {
                if let Some(title) = &update.title {
                    habit.title = title.clone();
                }
                if let Some(description) = &update.description {
                    habit.description = Some(description.clone());
                }
                if let Some(frequency) = update.frequency {
                    habit.frequency = frequency;
                }
                if let Some(tags) = &update.tags {
                    habit.tags = tags.clone();
                }
                if let Some(reminder_time) = &update.reminder_time {
                    habit.reminder_time = Some(reminder_time.clone());
                }
            }
            Ok(())
        }

        async fn save_streak(&self, id: ObjectId, streak: i32, longest_streak: i32) -> Result<()> {
            let mut habits = self.habits.lock().unwrap();
            if let Some(habit) = habits.iter_mut().find(|h| h._id == Some(id)) {
                habit.streak = streak;
                habit.longest_streak = longest_streak;
            }
            Ok(())
        }

        async fn remove(&self, id: ObjectId) -> Result<()> {
            let mut habits = self.habits.lock().unwrap();
            if let Some(habit) = habits.iter_mut().find(|h| h._id == Some(id)) {
                habit.metadata.is_deleted = true;
            }
            Ok(())
        }
    }

    /// In-memory tracking log store enforcing the `(habit, date)` unique
    /// index the way MongoDB reports it
    #[derive(Default)]
    pub struct MemoryTrackingLogStore {
        logs: Mutex<Vec<TrackingLogDoc>>,
    }

    impl MemoryTrackingLogStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.logs.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl TrackingLogStore for MemoryTrackingLogStore {
        async fn find_on_day(
            &self,
            habit: ObjectId,
            day: DateTime,
        ) -> Result<Option<TrackingLogDoc>> {
            Ok(self
                .logs
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.habit == habit && l.date == day)
                .cloned())
        }

        async fn insert(&self, mut log: TrackingLogDoc) -> Result<TrackingLogDoc> {
            let mut logs = self.logs.lock().unwrap();
            if logs.iter().any(|l| l.habit == log.habit && l.date == log.date) {
                return Err(CadenceError::Database(
                    "Insert failed: E11000 duplicate key error collection: \
                     cadence.tracking_logs index: habit_date_unique"
                        .into(),
                ));
            }
            log._id = Some(ObjectId::new());
            logs.push(log.clone());
            Ok(log)
        }

        async fn find_since(
            &self,
            habit: ObjectId,
            cutoff: DateTime,
        ) -> Result<Vec<TrackingLogDoc>> {
            let mut logs: Vec<TrackingLogDoc> = self
                .logs
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.habit == habit && l.date >= cutoff)
                .cloned()
                .collect();
            logs.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(logs)
        }
    }
}
