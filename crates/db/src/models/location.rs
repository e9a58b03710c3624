//! Location and device models.

use floodwatch_core::error::CoreError;
use floodwatch_core::types::{DbId, LocationId, Timestamp};
use floodwatch_core::water_level::SensorConfig;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Location {
    pub id: DbId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: Timestamp,
}

/// A location joined with its (optional) sensor and camera device ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LocationWithDevices {
    pub id: DbId,
    pub name: String,
    pub sensor_device_id: Option<DbId>,
    pub camera_device_id: Option<DbId>,
}

impl LocationWithDevices {
    pub fn location_id(&self) -> LocationId {
        LocationId(self.id)
    }
}

/// A row from the `sensor_devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SensorDevice {
    pub id: DbId,
    pub location_id: DbId,
    pub device_name: String,
    pub sensor_config: serde_json::Value,
    pub last_seen: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl SensorDevice {
    /// Parsed calibration for this device.
    pub fn config(&self) -> Result<SensorConfig, CoreError> {
        SensorConfig::from_setting(&self.sensor_config)
    }
}

/// A row from the `camera_devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CameraDevice {
    pub id: DbId,
    pub location_id: DbId,
    pub device_name: String,
    pub created_at: Timestamp,
}
