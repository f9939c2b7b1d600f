//! Habit domain: lifecycle CRUD and the tracking engine
//!
//! Store access goes through the `HabitStore` and `TrackingLogStore`
//! traits so the engine can be driven by in-memory fakes in tests and by
//! MongoDB in production.

pub mod lifecycle;
pub mod store;
pub mod tracking;

pub use lifecycle::{HabitLifecycle, HabitPage, HabitPatch, NewHabit, PAGE_SIZE};
pub use store::{
    HabitStore, HabitUpdate, MongoHabitStore, MongoTrackingLogStore, TrackingLogStore,
};
pub use tracking::{TrackOutcome, TrackingEngine};
