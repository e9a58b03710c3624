//! Route definitions for per-location telemetry and fusion endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{fusion, telemetry};
use crate::state::AppState;

/// Routes mounted at `/locations`.
///
/// ```text
/// GET  /{location_id}/fusion                -> get_fusion
/// POST /{location_id}/sensor-readings       -> ingest_sensor_reading
/// POST /{location_id}/blockage-detections   -> ingest_blockage_detection
/// POST /{location_id}/weather               -> ingest_weather
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{location_id}/fusion", get(fusion::get_fusion))
        .route(
            "/{location_id}/sensor-readings",
            post(telemetry::ingest_sensor_reading),
        )
        .route(
            "/{location_id}/blockage-detections",
            post(telemetry::ingest_blockage_detection),
        )
        .route("/{location_id}/weather", post(telemetry::ingest_weather))
}
