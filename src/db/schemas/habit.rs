//! Habit document schema
//!
//! Streak fields are derived state owned by the tracking engine; nothing
//! else writes them. `longest_streak >= streak` holds after every
//! mutation.

use std::fmt;

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for habits
pub const HABIT_COLLECTION: &str = "habits";

/// How often a habit is meant to be completed.
///
/// Stored metadata only: the streak rule always uses a one-day
/// continuation window regardless of frequency.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    /// Parse the wire form ("daily" / "weekly")
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

/// Habit document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HabitDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user, immutable after creation
    pub user: ObjectId,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub frequency: Frequency,

    /// Consecutive-day completion count ending at the most recent track
    #[serde(default)]
    pub streak: i32,

    /// Highest streak ever reached, never decreases
    #[serde(default)]
    pub longest_streak: i32,

    /// Free-form labels, order preserved for display
    #[serde(default)]
    pub tags: Vec<String>,

    /// Optional reminder time of day, e.g. "09:00"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

impl HabitDoc {
    /// Create a new habit with zeroed streaks
    pub fn new(
        user: ObjectId,
        title: String,
        description: Option<String>,
        frequency: Frequency,
        tags: Vec<String>,
        reminder_time: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user,
            title,
            description,
            frequency,
            streak: 0,
            longest_streak: 0,
            tags,
            reminder_time,
        }
    }
}

impl IntoIndexes for HabitDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Owner-scoped list queries
            (
                doc! { "user": 1 },
                Some(IndexOptions::builder().name("user_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for HabitDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
