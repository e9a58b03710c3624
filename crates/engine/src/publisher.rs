//! Delivery of recomputed fusion results.
//!
//! Workers hand each fresh [`FusionAnalysisData`] to a [`FusionPublisher`]
//! instead of reaching into the delivery layer themselves.

use async_trait::async_trait;
use floodwatch_core::fusion::FusionAnalysisData;
use floodwatch_core::types::LocationId;
use floodwatch_events::{Broadcaster, Envelope, EventKind};

#[async_trait]
pub trait FusionPublisher: Send + Sync {
    /// Deliver a result. Best-effort: failures are handled internally.
    async fn publish_fusion(&self, location_id: LocationId, analysis: &FusionAnalysisData);
}

#[async_trait]
impl FusionPublisher for Broadcaster {
    async fn publish_fusion(&self, location_id: LocationId, analysis: &FusionAnalysisData) {
        let payload = match serde_json::to_value(analysis) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(location_id = %location_id, error = %e, "Failed to serialize fusion analysis");
                return;
            }
        };
        let envelope = Envelope::success(EventKind::FusionAnalysisUpdate, payload);
        let report = self.publish(location_id, &envelope).await;
        tracing::debug!(
            location_id = %location_id,
            delivered = report.delivered,
            pruned = report.pruned,
            "Fusion analysis published",
        );
    }
}
