//! Floodwatch domain core.
//!
//! Pure logic with no I/O: the typed source statuses produced by the three
//! telemetry feeds, the alert threshold configuration, the fusion scoring
//! engine, freshness windows, and the producer-side derivations that turn
//! raw readings into typed statuses.

pub mod error;
pub mod freshness;
pub mod fusion;
pub mod status;
pub mod thresholds;
pub mod types;
pub mod water_level;
pub mod weather;
