//! Ingestion endpoints for the three telemetry feeds.
//!
//! Each endpoint persists the raw reading, derives the typed status,
//! broadcasts the per-source envelope to the location's subscribers and
//! finally hands the status to the state registry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use floodwatch_core::error::CoreError;
use floodwatch_core::status::{
    BlockageLevel, BlockageStatus, SourceUpdate, WaterLevelStatus, WeatherStatus,
};
use floodwatch_core::types::{DbId, LocationId, Timestamp};
use floodwatch_core::water_level::SensorAlertLevel;
use floodwatch_core::weather::describe_precipitation;
use floodwatch_db::models::reading::{
    CreateModelReading, CreateSensorReading, CreateWeatherReading, ModelReading, SensorReading,
    WeatherReading,
};
use floodwatch_db::repositories::{
    CameraDeviceRepo, LocationRepo, ModelReadingRepo, SensorDeviceRepo, SensorReadingRepo,
    WeatherRepo,
};
use floodwatch_events::{Envelope, EventKind};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SensorReadingRequest {
    pub raw_distance_cm: f64,
    /// Defaults to the time of receipt.
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct SensorReadingResponse {
    pub reading: SensorReading,
    pub status: WaterLevelStatus,
    pub alert_level: SensorAlertLevel,
}

#[derive(Debug, Deserialize)]
pub struct BlockageDetectionRequest {
    pub status: BlockageLevel,
    pub confidence: f64,
    pub image_path: String,
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct BlockageDetectionResponse {
    pub reading: ModelReading,
    pub status: BlockageStatus,
}

#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    pub precipitation_mm: f64,
    pub weather_code: i32,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub reading: WeatherReading,
    pub status: WeatherStatus,
    pub description: &'static str,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_sensor(input: &SensorReadingRequest) -> Result<(), CoreError> {
    if !input.raw_distance_cm.is_finite() || input.raw_distance_cm < 0.0 {
        return Err(CoreError::Validation(
            "raw_distance_cm must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_blockage(input: &BlockageDetectionRequest) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&input.confidence) {
        return Err(CoreError::Validation(
            "confidence must be between 0 and 1".to_string(),
        ));
    }
    if input.image_path.trim().is_empty() {
        return Err(CoreError::Validation("image_path is required".to_string()));
    }
    Ok(())
}

fn validate_weather(input: &WeatherRequest) -> Result<(), CoreError> {
    if !input.precipitation_mm.is_finite() || input.precipitation_mm < 0.0 {
        return Err(CoreError::Validation(
            "precipitation_mm must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /locations/{location_id}/sensor-readings
pub async fn ingest_sensor_reading(
    State(state): State<AppState>,
    Path(location_id): Path<DbId>,
    Json(input): Json<SensorReadingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SensorReadingResponse>>)> {
    validate_sensor(&input)?;

    let device = SensorDeviceRepo::find_by_location(&state.pool, location_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "SensorDevice for location",
            id: location_id,
        })?;
    let config = device.config()?;

    let create_dto = CreateSensorReading {
        sensor_device_id: device.id,
        water_level_cm: config.water_level_cm(input.raw_distance_cm),
        raw_distance_cm: input.raw_distance_cm,
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
    };
    let reading = SensorReadingRepo::insert(&state.pool, &create_dto).await?;
    SensorDeviceRepo::touch(&state.pool, device.id).await?;

    let previous =
        SensorReadingRepo::previous_before(&state.pool, device.id, reading.timestamp).await?;
    let status = reading.to_status(previous.as_ref(), &config);
    let alert_level = config.alert_level(reading.water_level_cm);

    tracing::info!(
        location_id,
        water_level_cm = reading.water_level_cm,
        trend = status.trend.as_str(),
        "Sensor reading ingested",
    );
    dispatch(&state, LocationId(location_id), status.clone().into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SensorReadingResponse {
                reading,
                status,
                alert_level,
            },
        }),
    ))
}

/// POST /locations/{location_id}/blockage-detections
pub async fn ingest_blockage_detection(
    State(state): State<AppState>,
    Path(location_id): Path<DbId>,
    Json(input): Json<BlockageDetectionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BlockageDetectionResponse>>)> {
    validate_blockage(&input)?;

    let camera = CameraDeviceRepo::find_by_location(&state.pool, location_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "CameraDevice for location",
            id: location_id,
        })?;

    let create_dto = CreateModelReading {
        camera_device_id: camera.id,
        image_path: input.image_path,
        blockage_status: input.status,
        confidence: input.confidence,
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
    };
    let reading = ModelReadingRepo::insert(&state.pool, &create_dto).await?;
    let status = reading.to_status()?;

    tracing::info!(
        location_id,
        status = %status.status,
        confidence = reading.confidence,
        "Blockage detection ingested",
    );
    dispatch(&state, LocationId(location_id), status.clone().into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BlockageDetectionResponse { reading, status },
        }),
    ))
}

/// POST /locations/{location_id}/weather
pub async fn ingest_weather(
    State(state): State<AppState>,
    Path(location_id): Path<DbId>,
    Json(input): Json<WeatherRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<WeatherResponse>>)> {
    validate_weather(&input)?;

    LocationRepo::find_by_id(&state.pool, location_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Location",
            id: location_id,
        })?;

    let create_dto = CreateWeatherReading {
        location_id,
        precipitation_mm: input.precipitation_mm,
        weather_code: input.weather_code,
    };
    let reading = WeatherRepo::insert(&state.pool, &create_dto).await?;
    let status = reading.to_status();

    tracing::info!(
        location_id,
        precipitation_mm = reading.precipitation_mm,
        condition = %status.condition,
        "Weather observation ingested",
    );
    dispatch(&state, LocationId(location_id), status.clone().into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: WeatherResponse {
                description: describe_precipitation(reading.precipitation_mm),
                reading,
                status,
            },
        }),
    ))
}

/// Broadcast the per-source envelope, then enqueue the update.
///
/// The reading is already persisted at this point, so a refusal from the
/// registry is logged rather than surfaced to the device.
async fn dispatch(state: &AppState, location_id: LocationId, update: SourceUpdate) -> AppResult<()> {
    let payload = match &update {
        SourceUpdate::Blockage(s) => serde_json::to_value(s),
        SourceUpdate::WaterLevel(s) => serde_json::to_value(s),
        SourceUpdate::Weather(s) => serde_json::to_value(s),
    }
    .map_err(|e| AppError::InternalError(format!("failed to serialize status: {e}")))?;

    let kind = update.kind();
    let envelope = Envelope::success(EventKind::for_source(kind), payload);
    state.broadcaster.publish(location_id, &envelope).await;

    if let Err(e) = state.registry.update(location_id, update).await {
        tracing::warn!(
            location_id = %location_id,
            source = %kind,
            error = %e,
            "Fusion update not applied",
        );
    }
    Ok(())
}
