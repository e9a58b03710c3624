//! Repositories for `locations`, `sensor_devices` and `camera_devices`.

use floodwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::location::{CameraDevice, Location, LocationWithDevices, SensorDevice};

const LOCATION_COLUMNS: &str = "id, name, latitude, longitude, created_at";

const SENSOR_DEVICE_COLUMNS: &str =
    "id, location_id, device_name, sensor_config, last_seen, created_at";

const CAMERA_DEVICE_COLUMNS: &str = "id, location_id, device_name, created_at";

pub struct LocationRepo;

impl LocationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Location>, sqlx::Error> {
        let query = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1");
        sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every location with its sensor and camera device ids, if any.
    pub async fn list_with_devices(pool: &PgPool) -> Result<Vec<LocationWithDevices>, sqlx::Error> {
        sqlx::query_as::<_, LocationWithDevices>(
            "SELECT l.id, l.name, s.id AS sensor_device_id, c.id AS camera_device_id \
             FROM locations l \
             LEFT JOIN sensor_devices s ON s.location_id = l.id \
             LEFT JOIN camera_devices c ON c.location_id = l.id \
             ORDER BY l.id",
        )
        .fetch_all(pool)
        .await
    }
}

pub struct SensorDeviceRepo;

impl SensorDeviceRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SensorDevice>, sqlx::Error> {
        let query = format!("SELECT {SENSOR_DEVICE_COLUMNS} FROM sensor_devices WHERE id = $1");
        sqlx::query_as::<_, SensorDevice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_location(
        pool: &PgPool,
        location_id: DbId,
    ) -> Result<Option<SensorDevice>, sqlx::Error> {
        let query =
            format!("SELECT {SENSOR_DEVICE_COLUMNS} FROM sensor_devices WHERE location_id = $1");
        sqlx::query_as::<_, SensorDevice>(&query)
            .bind(location_id)
            .fetch_optional(pool)
            .await
    }

    /// Record that the device has just reported.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sensor_devices SET last_seen = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

pub struct CameraDeviceRepo;

impl CameraDeviceRepo {
    pub async fn find_by_location(
        pool: &PgPool,
        location_id: DbId,
    ) -> Result<Option<CameraDevice>, sqlx::Error> {
        let query =
            format!("SELECT {CAMERA_DEVICE_COLUMNS} FROM camera_devices WHERE location_id = $1");
        sqlx::query_as::<_, CameraDevice>(&query)
            .bind(location_id)
            .fetch_optional(pool)
            .await
    }
}
