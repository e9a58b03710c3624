//! Floodwatch state engine.
//!
//! Owns the per-location [`FusionState`](floodwatch_core::fusion::FusionState)
//! instances behind a [`StateRegistry`]. Each location is driven by a single
//! worker task, so updates for one location are applied strictly in arrival
//! order while different locations proceed independently.
//!
//! External data reaches the engine through the traits in [`collaborators`];
//! results leave it through a [`FusionPublisher`].

pub mod bootstrap;
pub mod cache;
pub mod collaborators;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod snapshot;
mod worker;

#[cfg(test)]
mod testing;

pub use cache::CachedThresholds;
pub use collaborators::{
    LocationDevices, LocationDirectory, ReadingStore, StaticThresholds, ThresholdProvider,
};
pub use error::{EngineError, EngineResult};
pub use publisher::FusionPublisher;
pub use registry::{RegistryConfig, StateRegistry, UnknownLocationPolicy};
