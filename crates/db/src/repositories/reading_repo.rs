//! Repositories for the three telemetry tables.

use floodwatch_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::reading::{
    CreateModelReading, CreateSensorReading, CreateWeatherReading, ModelReading, SensorReading,
    WeatherReading,
};

const SENSOR_READING_COLUMNS: &str =
    "id, sensor_device_id, water_level_cm, raw_distance_cm, timestamp, created_at";

const MODEL_READING_COLUMNS: &str =
    "id, camera_device_id, image_path, blockage_status, confidence, timestamp, created_at";

const WEATHER_COLUMNS: &str = "id, location_id, precipitation_mm, weather_code, created_at";

pub struct SensorReadingRepo;

impl SensorReadingRepo {
    pub async fn insert(
        pool: &PgPool,
        input: &CreateSensorReading,
    ) -> Result<SensorReading, sqlx::Error> {
        let query = format!(
            "INSERT INTO sensor_readings (sensor_device_id, water_level_cm, raw_distance_cm, timestamp) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SENSOR_READING_COLUMNS}"
        );
        sqlx::query_as::<_, SensorReading>(&query)
            .bind(input.sensor_device_id)
            .bind(input.water_level_cm)
            .bind(input.raw_distance_cm)
            .bind(input.timestamp)
            .fetch_one(pool)
            .await
    }

    pub async fn latest(
        pool: &PgPool,
        sensor_device_id: DbId,
    ) -> Result<Option<SensorReading>, sqlx::Error> {
        let query = format!(
            "SELECT {SENSOR_READING_COLUMNS} FROM sensor_readings \
             WHERE sensor_device_id = $1 \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, SensorReading>(&query)
            .bind(sensor_device_id)
            .fetch_optional(pool)
            .await
    }

    /// The reading immediately before `before`, used for the change rate.
    pub async fn previous_before(
        pool: &PgPool,
        sensor_device_id: DbId,
        before: Timestamp,
    ) -> Result<Option<SensorReading>, sqlx::Error> {
        let query = format!(
            "SELECT {SENSOR_READING_COLUMNS} FROM sensor_readings \
             WHERE sensor_device_id = $1 AND timestamp < $2 \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, SensorReading>(&query)
            .bind(sensor_device_id)
            .bind(before)
            .fetch_optional(pool)
            .await
    }
}

pub struct ModelReadingRepo;

impl ModelReadingRepo {
    pub async fn insert(
        pool: &PgPool,
        input: &CreateModelReading,
    ) -> Result<ModelReading, sqlx::Error> {
        let query = format!(
            "INSERT INTO model_readings (camera_device_id, image_path, blockage_status, confidence, timestamp) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MODEL_READING_COLUMNS}"
        );
        sqlx::query_as::<_, ModelReading>(&query)
            .bind(input.camera_device_id)
            .bind(&input.image_path)
            .bind(input.blockage_status.as_str())
            .bind(input.confidence)
            .bind(input.timestamp)
            .fetch_one(pool)
            .await
    }

    pub async fn latest(
        pool: &PgPool,
        camera_device_id: DbId,
    ) -> Result<Option<ModelReading>, sqlx::Error> {
        let query = format!(
            "SELECT {MODEL_READING_COLUMNS} FROM model_readings \
             WHERE camera_device_id = $1 \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, ModelReading>(&query)
            .bind(camera_device_id)
            .fetch_optional(pool)
            .await
    }
}

pub struct WeatherRepo;

impl WeatherRepo {
    pub async fn insert(
        pool: &PgPool,
        input: &CreateWeatherReading,
    ) -> Result<WeatherReading, sqlx::Error> {
        let query = format!(
            "INSERT INTO weather (location_id, precipitation_mm, weather_code) \
             VALUES ($1, $2, $3) \
             RETURNING {WEATHER_COLUMNS}"
        );
        sqlx::query_as::<_, WeatherReading>(&query)
            .bind(input.location_id)
            .bind(input.precipitation_mm)
            .bind(input.weather_code)
            .fetch_one(pool)
            .await
    }

    pub async fn latest(
        pool: &PgPool,
        location_id: DbId,
    ) -> Result<Option<WeatherReading>, sqlx::Error> {
        let query = format!(
            "SELECT {WEATHER_COLUMNS} FROM weather \
             WHERE location_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, WeatherReading>(&query)
            .bind(location_id)
            .fetch_optional(pool)
            .await
    }
}
