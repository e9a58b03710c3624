//! Per-location worker.
//!
//! Every mutation of a location's [`FusionState`] goes through one task that
//! drains a bounded command queue in arrival order, so update, recompute and
//! publish for a location never interleave. Readers see the state through a
//! `watch` channel that is only written after a successful recompute.

use std::sync::Arc;

use floodwatch_core::fusion::{FusionData, FusionState};
use floodwatch_core::status::SourceUpdate;
use floodwatch_core::types::LocationId;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::collaborators::ThresholdProvider;
use crate::error::EngineResult;
use crate::publisher::FusionPublisher;

pub(crate) type Ack = oneshot::Sender<EngineResult<FusionData>>;

/// Work item for a location worker.
#[derive(Debug)]
pub(crate) struct Command {
    pub update: SourceUpdate,
    /// Present when the caller awaits the recompute result.
    pub ack: Option<Ack>,
}

pub(crate) struct LocationWorker {
    location_id: LocationId,
    state: FusionState,
    thresholds: Arc<dyn ThresholdProvider>,
    publisher: Arc<dyn FusionPublisher>,
    snapshot: watch::Sender<FusionState>,
}

impl LocationWorker {
    /// Create a worker around an already bootstrapped state.
    ///
    /// Returns the worker and the receiving end of its snapshot channel.
    pub(crate) fn new(
        location_id: LocationId,
        state: FusionState,
        thresholds: Arc<dyn ThresholdProvider>,
        publisher: Arc<dyn FusionPublisher>,
    ) -> (Self, watch::Receiver<FusionState>) {
        let (snapshot, snapshot_rx) = watch::channel(state.clone());
        let worker = Self {
            location_id,
            state,
            thresholds,
            publisher,
            snapshot,
        };
        (worker, snapshot_rx)
    }

    /// Drain commands until the queue closes or `cancel` fires.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        tracing::info!(location_id = %self.location_id, "Location worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(location_id = %self.location_id, "Location worker shutting down");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle(command).await;
                }
            }
        }

        tracing::info!(location_id = %self.location_id, "Location worker stopped");
    }

    async fn handle(&mut self, command: Command) {
        let Command { update, ack } = command;
        let source = update.kind();
        self.state.apply(update);

        let result = self.recompute().await;
        if let Err(e) = &result {
            tracing::error!(location_id = %self.location_id, source = %source, error = %e, "Recompute failed");
        }
        if let Some(ack) = ack {
            let _ = ack.send(result);
        }
    }

    /// Recompute, expose the new snapshot, then publish the analysis once
    /// all three sources are present.
    ///
    /// On a threshold error the slot change is kept but neither the snapshot
    /// nor subscribers see it until the next successful recompute.
    async fn recompute(&mut self) -> EngineResult<FusionData> {
        let thresholds = self.thresholds.alert_thresholds().await?;
        let fusion = self.state.recompute(&thresholds).clone();
        tracing::debug!(
            location_id = %self.location_id,
            risk_score = fusion.risk_score,
            alert_tier = fusion.alert_tier.as_str(),
            conditions = fusion.triggered_conditions.len(),
            "Fusion recomputed",
        );

        self.snapshot.send_replace(self.state.clone());

        if let Some(analysis) = self.state.analysis() {
            self.publisher.publish_fusion(self.location_id, analysis).await;
        }
        Ok(fusion)
    }
}
