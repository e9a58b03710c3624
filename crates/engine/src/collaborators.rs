//! Seams to the outside world: thresholds, persisted readings and the
//! location directory.
//!
//! The engine never talks to a database directly. The API crate provides
//! Postgres-backed implementations; tests use in-memory ones.

use async_trait::async_trait;
use floodwatch_core::status::{
    BlockageStatus, SourceKind, SourceUpdate, WaterLevelStatus, WeatherStatus,
};
use floodwatch_core::thresholds::ThresholdConfig;
use floodwatch_core::types::{DbId, LocationId};

use crate::error::EngineResult;

/// Source of the score-to-tier boundaries.
#[async_trait]
pub trait ThresholdProvider: Send + Sync {
    /// Current thresholds. Absence is an error, never a default.
    async fn alert_thresholds(&self) -> EngineResult<ThresholdConfig>;
}

/// Latest persisted reading per source, already derived into typed statuses.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn latest_blockage(&self, camera_device_id: DbId) -> EngineResult<Option<BlockageStatus>>;

    async fn latest_water_level(
        &self,
        sensor_device_id: DbId,
    ) -> EngineResult<Option<WaterLevelStatus>>;

    async fn latest_weather(&self, location_id: LocationId) -> EngineResult<Option<WeatherStatus>>;
}

/// Enumerates monitored locations and their device mapping.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn known_locations_with_devices(&self) -> EngineResult<Vec<LocationDevices>>;
}

/// A location and the devices that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDevices {
    pub location_id: LocationId,
    pub name: String,
    pub sensor_device_id: Option<DbId>,
    pub camera_device_id: Option<DbId>,
}

impl LocationDevices {
    /// Entry for a location registered on first observation, with no
    /// device mapping.
    pub fn unmapped(location_id: LocationId) -> Self {
        Self {
            location_id,
            name: String::new(),
            sensor_device_id: None,
            camera_device_id: None,
        }
    }

    /// `true` when both the sensor and the camera are known.
    pub fn is_mapped(&self) -> bool {
        self.sensor_device_id.is_some() && self.camera_device_id.is_some()
    }
}

/// Fetch the latest persisted reading of one source for a location.
///
/// A source whose device is not mapped has no reading.
pub async fn fetch_latest(
    store: &dyn ReadingStore,
    devices: &LocationDevices,
    kind: SourceKind,
) -> EngineResult<Option<SourceUpdate>> {
    let update = match kind {
        SourceKind::WaterLevel => match devices.sensor_device_id {
            Some(id) => store.latest_water_level(id).await?.map(SourceUpdate::from),
            None => None,
        },
        SourceKind::Blockage => match devices.camera_device_id {
            Some(id) => store.latest_blockage(id).await?.map(SourceUpdate::from),
            None => None,
        },
        SourceKind::Weather => store
            .latest_weather(devices.location_id)
            .await?
            .map(SourceUpdate::from),
    };
    Ok(update)
}

/// Fixed thresholds, for deployments and tests without a settings store.
#[derive(Debug, Clone, Copy)]
pub struct StaticThresholds(pub ThresholdConfig);

#[async_trait]
impl ThresholdProvider for StaticThresholds {
    async fn alert_thresholds(&self) -> EngineResult<ThresholdConfig> {
        Ok(self.0)
    }
}
