use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Locations with a running fusion worker.
    pub locations: usize,
    /// Open dashboard connections across all locations.
    pub subscribers: usize,
}

/// GET /health
///
/// Always 200; the in-memory engine keeps serving while the database is down.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = floodwatch_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        locations: state.registry.locations().await.len(),
        subscribers: state.broadcaster.connection_count().await,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
