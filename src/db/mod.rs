//! Database layer for Cadence
//!
//! Provides MongoDB storage for users, habits, and tracking logs.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{
    Frequency, HabitDoc, Metadata, TrackingLogDoc, UserDoc, HABIT_COLLECTION,
    TRACKING_LOG_COLLECTION, USER_COLLECTION,
};
