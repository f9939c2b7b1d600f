//! Tracking engine: daily completion records and streak bookkeeping
//!
//! `track` records at most one completion per habit per calendar day and
//! keeps the streak counters current. The `(habit, date)` unique index is
//! the authoritative duplicate guard: two same-day calls racing past the
//! pre-check resolve at the insert, and the loser's uniqueness violation
//! is translated back into the same `AlreadyTracked` outcome. The log is
//! inserted before the streak write, so a lost race can never
//! double-increment a streak.

use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::clock::{start_of_day, Clock};
use crate::db::TrackingLogDoc;
use crate::habits::lifecycle::owned_habit;
use crate::habits::store::{HabitStore, TrackingLogStore};
use crate::types::{CadenceError, Result};

/// Result of a successful track operation
#[derive(Debug)]
pub struct TrackOutcome {
    pub log: TrackingLogDoc,
    pub streak: i32,
    pub longest_streak: i32,
}

/// Streak and history logic over injected stores and clock
pub struct TrackingEngine {
    habits: Arc<dyn HabitStore>,
    logs: Arc<dyn TrackingLogStore>,
    clock: Arc<dyn Clock>,
}

impl TrackingEngine {
    pub fn new(
        habits: Arc<dyn HabitStore>,
        logs: Arc<dyn TrackingLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            habits,
            logs,
            clock,
        }
    }

    /// Record today's completion for a habit and update its streak.
    ///
    /// The streak continues only when yesterday has a log; otherwise it
    /// resets to 1. The one-day window applies to weekly habits too --
    /// frequency is stored metadata and does not alter this rule.
    pub async fn track(&self, habit_id: ObjectId, caller: ObjectId) -> Result<TrackOutcome> {
        let habit = owned_habit(self.habits.as_ref(), caller, habit_id).await?;

        let now = self.clock.now();
        let today = day_stamp(now);
        let yesterday = day_stamp(now - Duration::days(1));

        // Fast path: already tracked today
        if self.logs.find_on_day(habit_id, today).await?.is_some() {
            return Err(CadenceError::AlreadyTracked);
        }

        let streak = if self.logs.find_on_day(habit_id, yesterday).await?.is_some() {
            habit.streak + 1
        } else {
            1
        };
        let longest_streak = streak.max(habit.longest_streak);

        // The unique index settles concurrent same-day tracks; insert the
        // log before touching the streak so a lost race changes nothing.
        let log = match self.logs.insert(TrackingLogDoc::new(habit_id, today)).await {
            Ok(log) => log,
            Err(e) if e.is_duplicate_key() => return Err(CadenceError::AlreadyTracked),
            Err(e) => return Err(e),
        };

        self.habits
            .save_streak(habit_id, streak, longest_streak)
            .await?;

        info!(
            "Tracked habit {} (streak {}, longest {})",
            habit_id, streak, longest_streak
        );

        Ok(TrackOutcome {
            log,
            streak,
            longest_streak,
        })
    }

    /// Logs for the trailing seven days, newest first.
    ///
    /// The cutoff is the start of day seven days ago; no upper bound is
    /// applied, so a future-dated log would still appear.
    pub async fn history(&self, habit_id: ObjectId, caller: ObjectId) -> Result<Vec<TrackingLogDoc>> {
        owned_habit(self.habits.as_ref(), caller, habit_id).await?;

        let cutoff = day_stamp(self.clock.now() - Duration::days(7));
        self.logs.find_since(habit_id, cutoff).await
    }
}

/// Normalize an instant to its UTC calendar day as a BSON timestamp
fn day_stamp(ts: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(start_of_day(ts))
}
