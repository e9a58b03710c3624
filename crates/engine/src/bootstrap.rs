//! Startup load of last-known state for one location.

use floodwatch_core::freshness::GraceWindows;
use floodwatch_core::fusion::FusionState;
use floodwatch_core::status::SourceKind;
use floodwatch_core::types::Timestamp;

use crate::collaborators::{fetch_latest, LocationDevices, ReadingStore, ThresholdProvider};
use crate::error::EngineResult;

/// Build the initial [`FusionState`] for a location.
///
/// Each source slot is populated from the latest persisted reading only if
/// that reading is within its grace window at `now`; older readings leave
/// the slot empty. A failing store read also leaves the slot empty. One
/// recompute runs at the end, and its threshold errors propagate.
pub async fn load_initial_state(
    devices: &LocationDevices,
    store: &dyn ReadingStore,
    thresholds: &dyn ThresholdProvider,
    windows: &GraceWindows,
    now: Timestamp,
) -> EngineResult<FusionState> {
    let location_id = devices.location_id;
    let mut state = FusionState::new();

    for kind in SourceKind::ALL {
        let latest = match fetch_latest(store, devices, kind).await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(location_id = %location_id, source = %kind, error = %e, "Failed to load latest reading");
                continue;
            }
        };
        let Some(update) = latest else {
            tracing::debug!(location_id = %location_id, source = %kind, "No persisted reading");
            continue;
        };

        let observed_at = update.observed_at();
        if windows.for_source(kind).admits_at(observed_at, now) {
            tracing::debug!(location_id = %location_id, source = %kind, %observed_at, "Admitted persisted reading");
            state.apply(update);
        } else {
            tracing::info!(location_id = %location_id, source = %kind, %observed_at, "Persisted reading outside grace window, ignoring");
        }
    }

    let thresholds = thresholds.alert_thresholds().await?;
    let fusion = state.recompute(&thresholds).clone();
    tracing::info!(
        location_id = %location_id,
        risk_score = fusion.risk_score,
        alert_tier = fusion.alert_tier.as_str(),
        complete = state.is_complete(),
        "Initial state loaded",
    );
    Ok(state)
}
