//! Request handlers for the location endpoints.
//!
//! Ingestion handlers persist through the repositories in `floodwatch_db`
//! and feed the [`StateRegistry`](floodwatch_engine::StateRegistry); the
//! fusion handler reads its snapshots.

pub mod fusion;
pub mod telemetry;
