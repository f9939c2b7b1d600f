//! Database schemas for Cadence
//!
//! MongoDB document structures for users, habits, and tracking logs.

mod habit;
mod tracking_log;
mod user;

pub use habit::{Frequency, HabitDoc, HABIT_COLLECTION};
pub use tracking_log::{TrackingLogDoc, TRACKING_LOG_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata carried by every document: creation and update
/// timestamps plus a soft-delete marker.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamps
    pub fn new() -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }
}
