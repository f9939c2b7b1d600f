//! HTTP server for Cadence

pub mod http;

pub use http::{run, AppState};
