pub mod health;
pub mod locations;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws/locations/{location_id}                      WebSocket (per location)
///
/// /locations/{location_id}/fusion                  current analysis (GET)
/// /locations/{location_id}/sensor-readings         ingest water level (POST)
/// /locations/{location_id}/blockage-detections     ingest classifier verdict (POST)
/// /locations/{location_id}/weather                 ingest weather (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/locations/{location_id}", get(ws::ws_handler))
        .nest("/locations", locations::router())
}
