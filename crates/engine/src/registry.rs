//! Directory of monitored locations and their workers.
//!
//! [`StateRegistry`] is constructed once by the application and shared via
//! `Arc<StateRegistry>` between the telemetry handlers and the WebSocket
//! endpoint. It owns startup bootstrap, dispatch of source updates to the
//! right location worker, and snapshot lookups.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use floodwatch_core::error::CoreError;
use floodwatch_core::freshness::GraceWindows;
use floodwatch_core::fusion::{FusionAnalysisData, FusionData, FusionState};
use floodwatch_core::status::{BlockageStatus, SourceUpdate, WaterLevelStatus, WeatherStatus};
use floodwatch_core::types::LocationId;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::bootstrap::load_initial_state;
use crate::collaborators::{LocationDevices, LocationDirectory, ReadingStore, ThresholdProvider};
use crate::error::{EngineError, EngineResult};
use crate::publisher::FusionPublisher;
use crate::worker::{Command, LocationWorker};

/// Default bound on each location's command queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// How long shutdown waits for each worker to exit.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What happens to an update for a location the registry does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownLocationPolicy {
    /// Drop the update and report success.
    #[default]
    Ignore,
    /// Fail with [`EngineError::UnknownLocation`].
    Reject,
    /// Start an empty worker for the location and apply the update.
    Register,
}

impl UnknownLocationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
            Self::Register => "register",
        }
    }
}

impl FromStr for UnknownLocationPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            "register" => Ok(Self::Register),
            other => Err(CoreError::Configuration(format!(
                "unknown location policy '{other}', expected ignore, reject or register"
            ))),
        }
    }
}

impl fmt::Display for UnknownLocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    pub queue_capacity: usize,
    pub unknown_location_policy: UnknownLocationPolicy,
    pub windows: GraceWindows,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            unknown_location_policy: UnknownLocationPolicy::default(),
            windows: GraceWindows::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Bookkeeping for one running worker.
struct ManagedLocation {
    devices: LocationDevices,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<FusionState>,
    task_handle: tokio::task::JoinHandle<()>,
    /// Child of the registry's master token.
    cancel: CancellationToken,
}

pub struct StateRegistry {
    locations: RwLock<HashMap<LocationId, ManagedLocation>>,
    thresholds: Arc<dyn ThresholdProvider>,
    store: Arc<dyn ReadingStore>,
    directory: Arc<dyn LocationDirectory>,
    publisher: Arc<dyn FusionPublisher>,
    config: RegistryConfig,
    cancel: CancellationToken,
}

impl StateRegistry {
    pub fn new(
        thresholds: Arc<dyn ThresholdProvider>,
        store: Arc<dyn ReadingStore>,
        directory: Arc<dyn LocationDirectory>,
        publisher: Arc<dyn FusionPublisher>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            locations: RwLock::new(HashMap::new()),
            thresholds,
            store,
            directory,
            publisher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Bootstrap and start a worker for every known location.
    ///
    /// Locations without both a sensor and a camera device are skipped with a
    /// warning. Directory and threshold failures abort startup. Returns the
    /// number of locations registered.
    pub async fn start_all(&self) -> EngineResult<usize> {
        let known = self.directory.known_locations_with_devices().await?;
        tracing::info!(count = known.len(), "Loading monitored locations");

        let now = chrono::Utc::now();
        let mut registered = 0;
        for devices in known {
            if !devices.is_mapped() {
                tracing::warn!(
                    location_id = %devices.location_id,
                    name = %devices.name,
                    sensor_device_id = ?devices.sensor_device_id,
                    camera_device_id = ?devices.camera_device_id,
                    "Location has no complete device mapping, skipping",
                );
                continue;
            }

            let state = load_initial_state(
                &devices,
                self.store.as_ref(),
                self.thresholds.as_ref(),
                &self.config.windows,
                now,
            )
            .await?;
            self.spawn_location(devices, state).await;
            registered += 1;
        }

        tracing::info!(registered, "State registry started");
        Ok(registered)
    }

    /// Register a location with an already built state.
    ///
    /// Replaces any existing worker for the same id.
    pub async fn register(&self, devices: LocationDevices, state: FusionState) {
        self.spawn_location(devices, state).await;
    }

    /// Enqueue a source update for a location without waiting for the
    /// recompute.
    ///
    /// Unknown locations are handled per [`UnknownLocationPolicy`].
    pub async fn update(
        &self,
        location_id: LocationId,
        update: impl Into<SourceUpdate>,
    ) -> EngineResult<()> {
        let update = update.into();
        let Some(commands) = self.resolve(location_id).await? else {
            tracing::debug!(location_id = %location_id, source = %update.kind(), "Update for unknown location ignored");
            return Ok(());
        };
        commands
            .send(Command { update, ack: None })
            .await
            .map_err(|_| EngineError::WorkerStopped(location_id))
    }

    pub async fn update_blockage(
        &self,
        location_id: LocationId,
        status: BlockageStatus,
    ) -> EngineResult<()> {
        self.update(location_id, status).await
    }

    pub async fn update_water_level(
        &self,
        location_id: LocationId,
        status: WaterLevelStatus,
    ) -> EngineResult<()> {
        self.update(location_id, status).await
    }

    pub async fn update_weather(
        &self,
        location_id: LocationId,
        status: WeatherStatus,
    ) -> EngineResult<()> {
        self.update(location_id, status).await
    }

    /// Enqueue a source update and wait for the resulting [`FusionData`].
    ///
    /// Recompute errors such as missing thresholds are returned here. Since
    /// there is no result to hand back, an unknown location is an
    /// [`EngineError::UnknownLocation`] unless the policy registers it.
    pub async fn apply(
        &self,
        location_id: LocationId,
        update: impl Into<SourceUpdate>,
    ) -> EngineResult<FusionData> {
        let commands = self
            .resolve(location_id)
            .await?
            .ok_or(EngineError::UnknownLocation(location_id))?;

        let (ack, result) = oneshot::channel();
        commands
            .send(Command {
                update: update.into(),
                ack: Some(ack),
            })
            .await
            .map_err(|_| EngineError::WorkerStopped(location_id))?;

        result
            .await
            .map_err(|_| EngineError::WorkerStopped(location_id))?
    }

    /// Current analysis for a location, absent until all three sources have
    /// reported.
    pub async fn get(&self, location_id: LocationId) -> EngineResult<Option<FusionAnalysisData>> {
        self.with_snapshot(location_id, |state| state.analysis().cloned())
            .await
    }

    /// Current judgement for a location, available even with missing sources.
    pub async fn fusion_data(&self, location_id: LocationId) -> EngineResult<FusionData> {
        self.with_snapshot(location_id, |state| state.fusion_data().clone())
            .await
    }

    pub async fn devices(&self, location_id: LocationId) -> EngineResult<LocationDevices> {
        self.locations
            .read()
            .await
            .get(&location_id)
            .map(|managed| managed.devices.clone())
            .ok_or(EngineError::NotRegistered(location_id))
    }

    pub async fn contains(&self, location_id: LocationId) -> bool {
        self.locations.read().await.contains_key(&location_id)
    }

    /// Registered location ids in ascending order.
    pub async fn locations(&self) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = self.locations.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Stop every worker, waiting up to 5 seconds for each.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down state registry");
        self.cancel.cancel();

        let mut locations = self.locations.write().await;
        for (location_id, managed) in locations.drain() {
            managed.cancel.cancel();
            if tokio::time::timeout(WORKER_STOP_TIMEOUT, managed.task_handle)
                .await
                .is_err()
            {
                tracing::warn!(location_id = %location_id, "Location worker did not stop in time");
            }
        }

        tracing::info!("State registry shut down complete");
    }

    // ---- private helpers ----

    async fn with_snapshot<T>(
        &self,
        location_id: LocationId,
        read: impl FnOnce(&FusionState) -> T,
    ) -> EngineResult<T> {
        let locations = self.locations.read().await;
        let managed = locations
            .get(&location_id)
            .ok_or(EngineError::NotRegistered(location_id))?;
        let state = managed.snapshot.borrow();
        Ok(read(&state))
    }

    /// Command queue for a location, applying the unknown-location policy.
    async fn resolve(&self, location_id: LocationId) -> EngineResult<Option<mpsc::Sender<Command>>> {
        if let Some(managed) = self.locations.read().await.get(&location_id) {
            return Ok(Some(managed.commands.clone()));
        }

        match self.config.unknown_location_policy {
            UnknownLocationPolicy::Ignore => Ok(None),
            UnknownLocationPolicy::Reject => {
                tracing::warn!(location_id = %location_id, "Update for unknown location rejected");
                Err(EngineError::UnknownLocation(location_id))
            }
            UnknownLocationPolicy::Register => {
                tracing::info!(location_id = %location_id, "Registering location on first observation");
                let mut locations = self.locations.write().await;
                let managed = locations.entry(location_id).or_insert_with(|| {
                    self.start_worker(LocationDevices::unmapped(location_id), FusionState::new())
                });
                Ok(Some(managed.commands.clone()))
            }
        }
    }

    async fn spawn_location(&self, devices: LocationDevices, state: FusionState) {
        let location_id = devices.location_id;
        let managed = self.start_worker(devices, state);
        let previous = self.locations.write().await.insert(location_id, managed);
        if let Some(previous) = previous {
            tracing::warn!(location_id = %location_id, "Replacing existing location worker");
            previous.cancel.cancel();
        }
    }

    fn start_worker(&self, devices: LocationDevices, state: FusionState) -> ManagedLocation {
        let (commands, queue) = mpsc::channel(self.config.queue_capacity.max(1));
        let (worker, snapshot) = LocationWorker::new(
            devices.location_id,
            state,
            Arc::clone(&self.thresholds),
            Arc::clone(&self.publisher),
        );
        let cancel = self.cancel.child_token();
        let task_handle = tokio::spawn(worker.run(queue, cancel.clone()));

        ManagedLocation {
            devices,
            commands,
            snapshot,
            task_handle,
            cancel,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
