use std::sync::Arc;

use floodwatch_engine::{ReadingStore, StateRegistry};
use floodwatch_events::Broadcaster;

use crate::config::{FusionConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: floodwatch_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub fusion: Arc<FusionConfig>,
    /// Per-location subscriber sets for dashboard WebSockets.
    pub broadcaster: Arc<Broadcaster>,
    /// Per-location fusion state.
    pub registry: Arc<StateRegistry>,
    /// Latest persisted readings, used for the initial WebSocket snapshot.
    pub store: Arc<dyn ReadingStore>,
}
