//! Tracking log document schema
//!
//! One immutable record per habit per calendar day. The unique
//! `(habit, date)` index is the authoritative guard against duplicate
//! same-day tracking; the engine's pre-check is only a fast path.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for tracking logs
pub const TRACKING_LOG_COLLECTION: &str = "tracking_logs";

/// Completion record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackingLogDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Parent habit
    pub habit: ObjectId,

    /// Calendar day, normalized to UTC midnight
    pub date: DateTime,

    /// Always true in the creation path; no "missed" records exist
    #[serde(default)]
    pub completed: bool,
}

impl TrackingLogDoc {
    /// Create a completion record for the given day
    pub fn new(habit: ObjectId, date: DateTime) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            habit,
            date,
            completed: true,
        }
    }
}

impl IntoIndexes for TrackingLogDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one log per habit per day
            (
                doc! { "habit": 1, "date": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("habit_date_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for TrackingLogDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
