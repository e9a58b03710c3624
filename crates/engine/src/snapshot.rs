//! Initial messages for a freshly subscribed dashboard.

use floodwatch_core::freshness::GraceWindows;
use floodwatch_core::status::{SourceKind, SourceUpdate};
use floodwatch_core::types::Timestamp;
use floodwatch_events::{Envelope, EventKind};
use serde_json::Value;

use crate::collaborators::{fetch_latest, LocationDevices, ReadingStore};

/// One envelope per source kind describing the latest persisted reading.
///
/// Readings are classified against their windows at `now`: fresh ones are
/// `success`, stale ones `warning` with the payload kept, and expired or
/// absent ones `error` with a null payload. A failing store read counts as
/// absent. Always returns exactly three envelopes, in [`SourceKind::ALL`]
/// order.
pub async fn initial_envelopes(
    store: &dyn ReadingStore,
    devices: &LocationDevices,
    windows: &GraceWindows,
    now: Timestamp,
) -> Vec<Envelope> {
    let mut envelopes = Vec::with_capacity(SourceKind::ALL.len());

    for kind in SourceKind::ALL {
        let latest = match fetch_latest(store, devices, kind).await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(location_id = %devices.location_id, source = %kind, error = %e, "Failed to load reading for snapshot");
                None
            }
        };

        let reading = latest.and_then(|update| {
            let freshness = windows.for_source(kind).classify_at(update.observed_at(), now);
            payload(&update).map(|value| (freshness, value))
        });
        envelopes.push(Envelope::for_reading(EventKind::for_source(kind), reading));
    }

    envelopes
}

fn payload(update: &SourceUpdate) -> Option<Value> {
    let value = match update {
        SourceUpdate::Blockage(s) => serde_json::to_value(s),
        SourceUpdate::WaterLevel(s) => serde_json::to_value(s),
        SourceUpdate::Weather(s) => serde_json::to_value(s),
    };
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!(source = %update.kind(), error = %e, "Failed to serialize reading");
            None
        }
    }
}
