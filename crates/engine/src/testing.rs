//! In-memory collaborators shared by the engine's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Duration;
use floodwatch_core::fusion::FusionAnalysisData;
use floodwatch_core::status::{
    BlockageLevel, BlockageStatus, Trend, WaterLevelStatus, WeatherStatus,
};
use floodwatch_core::thresholds::ThresholdConfig;
use floodwatch_core::types::{DbId, LocationId, Timestamp};

use crate::collaborators::{LocationDevices, LocationDirectory, ReadingStore, ThresholdProvider};
use crate::error::{EngineError, EngineResult};
use crate::publisher::FusionPublisher;

pub(crate) fn thresholds() -> ThresholdConfig {
    ThresholdConfig {
        tier2_min: 45,
        tier2_max: 75,
        tier3_min: 76,
    }
}

pub(crate) fn now() -> Timestamp {
    use chrono::TimeZone;
    chrono::Utc
        .with_ymd_and_hms(2025, 6, 12, 14, 0, 0)
        .unwrap()
}

pub(crate) fn minutes_ago(minutes: i64) -> Timestamp {
    now() - Duration::minutes(minutes)
}

/// Location `id` with sensor `id * 10` and camera `id * 10 + 1`.
pub(crate) fn mapped(id: DbId) -> LocationDevices {
    LocationDevices {
        location_id: LocationId(id),
        name: format!("Site {id}"),
        sensor_device_id: Some(id * 10),
        camera_device_id: Some(id * 10 + 1),
    }
}

pub(crate) fn blockage(level: BlockageLevel, observed_at: Timestamp) -> BlockageStatus {
    BlockageStatus {
        status: level,
        observed_at,
    }
}

pub(crate) fn water(critical_percentage: f64, observed_at: Timestamp) -> WaterLevelStatus {
    WaterLevelStatus {
        water_level_cm: critical_percentage * 2.0,
        change_rate: 0.0,
        critical_percentage,
        trend: Trend::Stable,
        observed_at,
    }
}

pub(crate) fn weather(precipitation_mm: f64, observed_at: Timestamp) -> WeatherStatus {
    WeatherStatus {
        precipitation_mm,
        condition: "Rain".to_string(),
        observed_at,
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Returns [`thresholds`] or a configuration error, counting calls.
#[derive(Default)]
pub(crate) struct ToggleThresholds {
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ToggleThresholds {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThresholdProvider for ToggleThresholds {
    async fn alert_thresholds(&self) -> EngineResult<ThresholdConfig> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Configuration(
                "alert_thresholds setting not found".to_string(),
            ));
        }
        Ok(thresholds())
    }
}

// ---------------------------------------------------------------------------
// Readings and locations
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct MemoryStore {
    blockage: Mutex<HashMap<DbId, BlockageStatus>>,
    water_level: Mutex<HashMap<DbId, WaterLevelStatus>>,
    weather: Mutex<HashMap<LocationId, WeatherStatus>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn put_blockage(&self, camera_device_id: DbId, status: BlockageStatus) {
        if let Ok(mut map) = self.blockage.lock() {
            map.insert(camera_device_id, status);
        }
    }

    pub(crate) fn put_water_level(&self, sensor_device_id: DbId, status: WaterLevelStatus) {
        if let Ok(mut map) = self.water_level.lock() {
            map.insert(sensor_device_id, status);
        }
    }

    pub(crate) fn put_weather(&self, location_id: LocationId, status: WeatherStatus) {
        if let Ok(mut map) = self.weather.lock() {
            map.insert(location_id, status);
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> EngineResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(EngineError::Collaborator("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn latest_blockage(&self, camera_device_id: DbId) -> EngineResult<Option<BlockageStatus>> {
        self.check()?;
        Ok(self
            .blockage
            .lock()
            .ok()
            .and_then(|m| m.get(&camera_device_id).cloned()))
    }

    async fn latest_water_level(
        &self,
        sensor_device_id: DbId,
    ) -> EngineResult<Option<WaterLevelStatus>> {
        self.check()?;
        Ok(self
            .water_level
            .lock()
            .ok()
            .and_then(|m| m.get(&sensor_device_id).cloned()))
    }

    async fn latest_weather(&self, location_id: LocationId) -> EngineResult<Option<WeatherStatus>> {
        self.check()?;
        Ok(self
            .weather
            .lock()
            .ok()
            .and_then(|m| m.get(&location_id).cloned()))
    }
}

pub(crate) struct FixedDirectory(pub Vec<LocationDevices>);

#[async_trait]
impl LocationDirectory for FixedDirectory {
    async fn known_locations_with_devices(&self) -> EngineResult<Vec<LocationDevices>> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingPublisher {
    published: Mutex<Vec<(LocationId, FusionAnalysisData)>>,
}

impl RecordingPublisher {
    pub(crate) fn published(&self) -> Vec<(LocationId, FusionAnalysisData)> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FusionPublisher for RecordingPublisher {
    async fn publish_fusion(&self, location_id: LocationId, analysis: &FusionAnalysisData) {
        if let Ok(mut published) = self.published.lock() {
            published.push((location_id, analysis.clone()));
        }
    }
}
