//! Telemetry reading models for the three feeds.

use floodwatch_core::error::CoreError;
use floodwatch_core::status::{BlockageLevel, BlockageStatus, WaterLevelStatus, WeatherStatus};
use floodwatch_core::types::{DbId, Timestamp};
use floodwatch_core::water_level::SensorConfig;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Sensor readings
// ---------------------------------------------------------------------------

/// A row from the `sensor_readings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SensorReading {
    pub id: DbId,
    pub sensor_device_id: DbId,
    pub water_level_cm: f64,
    pub raw_distance_cm: f64,
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

impl SensorReading {
    /// Derive the water-level status given the reading before this one.
    pub fn to_status(
        &self,
        previous: Option<&SensorReading>,
        config: &SensorConfig,
    ) -> WaterLevelStatus {
        WaterLevelStatus::derive(
            self.water_level_cm,
            previous.map(|p| p.water_level_cm),
            config,
            self.timestamp,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSensorReading {
    pub sensor_device_id: DbId,
    pub water_level_cm: f64,
    pub raw_distance_cm: f64,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Model (blockage classifier) readings
// ---------------------------------------------------------------------------

/// A row from the `model_readings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModelReading {
    pub id: DbId,
    pub camera_device_id: DbId,
    pub image_path: String,
    pub blockage_status: String,
    pub confidence: f64,
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

impl ModelReading {
    pub fn to_status(&self) -> Result<BlockageStatus, CoreError> {
        Ok(BlockageStatus {
            status: self.blockage_status.parse::<BlockageLevel>()?,
            observed_at: self.timestamp,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModelReading {
    pub camera_device_id: DbId,
    pub image_path: String,
    pub blockage_status: BlockageLevel,
    pub confidence: f64,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// A row from the `weather` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeatherReading {
    pub id: DbId,
    pub location_id: DbId,
    pub precipitation_mm: f64,
    pub weather_code: i32,
    pub created_at: Timestamp,
}

impl WeatherReading {
    pub fn to_status(&self) -> WeatherStatus {
        WeatherStatus::from_observation(self.precipitation_mm, self.weather_code, self.created_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWeatherReading {
    pub location_id: DbId,
    pub precipitation_mm: f64,
    pub weather_code: i32,
}
