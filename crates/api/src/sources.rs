//! Postgres-backed implementations of the engine's collaborator traits.

use async_trait::async_trait;
use floodwatch_core::status::{BlockageStatus, WaterLevelStatus, WeatherStatus};
use floodwatch_core::thresholds::{ThresholdConfig, ALERT_THRESHOLDS_KEY};
use floodwatch_core::types::{DbId, LocationId};
use floodwatch_db::repositories::{
    LocationRepo, ModelReadingRepo, SensorDeviceRepo, SensorReadingRepo, SystemSettingRepo,
    WeatherRepo,
};
use floodwatch_db::DbPool;
use floodwatch_engine::{
    EngineError, EngineResult, LocationDevices, LocationDirectory, ReadingStore, ThresholdProvider,
};

fn db_err(err: sqlx::Error) -> EngineError {
    EngineError::Collaborator(format!("database error: {err}"))
}

/// Reads `alert_thresholds` from `system_settings` on every call.
///
/// Wrap in [`floodwatch_engine::CachedThresholds`] for production use.
pub struct SettingsThresholds {
    pool: DbPool,
}

impl SettingsThresholds {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThresholdProvider for SettingsThresholds {
    async fn alert_thresholds(&self) -> EngineResult<ThresholdConfig> {
        let value = SystemSettingRepo::get_value(&self.pool, ALERT_THRESHOLDS_KEY)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                EngineError::Configuration(format!("{ALERT_THRESHOLDS_KEY} setting not found"))
            })?;
        Ok(ThresholdConfig::from_setting(&value)?)
    }
}

/// Latest persisted readings, derived into typed statuses.
pub struct PgReadingStore {
    pool: DbPool,
}

impl PgReadingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn latest_blockage(&self, camera_device_id: DbId) -> EngineResult<Option<BlockageStatus>> {
        let reading = ModelReadingRepo::latest(&self.pool, camera_device_id)
            .await
            .map_err(db_err)?;
        match reading {
            Some(r) => Ok(Some(r.to_status()?)),
            None => Ok(None),
        }
    }

    async fn latest_water_level(
        &self,
        sensor_device_id: DbId,
    ) -> EngineResult<Option<WaterLevelStatus>> {
        let Some(reading) = SensorReadingRepo::latest(&self.pool, sensor_device_id)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let device = SensorDeviceRepo::find_by_id(&self.pool, sensor_device_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                EngineError::Collaborator(format!("sensor device {sensor_device_id} not found"))
            })?;
        let config = device.config()?;

        let previous =
            SensorReadingRepo::previous_before(&self.pool, sensor_device_id, reading.timestamp)
                .await
                .map_err(db_err)?;
        Ok(Some(reading.to_status(previous.as_ref(), &config)))
    }

    async fn latest_weather(&self, location_id: LocationId) -> EngineResult<Option<WeatherStatus>> {
        let reading = WeatherRepo::latest(&self.pool, location_id.get())
            .await
            .map_err(db_err)?;
        Ok(reading.map(|r| r.to_status()))
    }
}

/// Locations and device mapping from the `locations` table.
pub struct PgLocationDirectory {
    pool: DbPool,
}

impl PgLocationDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationDirectory for PgLocationDirectory {
    async fn known_locations_with_devices(&self) -> EngineResult<Vec<LocationDevices>> {
        let rows = LocationRepo::list_with_devices(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|row| LocationDevices {
                location_id: row.location_id(),
                name: row.name,
                sensor_device_id: row.sensor_device_id,
                camera_device_id: row.camera_device_id,
            })
            .collect())
    }
}
