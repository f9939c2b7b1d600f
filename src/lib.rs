//! Cadence - habit tracking REST API
//!
//! Users register, create habits, and record one completion per habit per
//! calendar day. The service maintains a consecutive-day streak and the
//! longest streak ever reached for each habit.
//!
//! ## Services
//!
//! - **Auth**: registration and login with argon2 password hashing and
//!   JWT bearer tokens
//! - **Habits**: owner-scoped CRUD with tag filtering and pagination
//! - **Tracking**: idempotent daily completion records with streak
//!   bookkeeping, backed by a unique `(habit, date)` index
//! - **History**: trailing seven-day completion log, newest first

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod habits;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CadenceError, Result};
