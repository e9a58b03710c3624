//! Time-bounded cache in front of a [`ThresholdProvider`].

use std::time::Duration;

use async_trait::async_trait;
use floodwatch_core::thresholds::ThresholdConfig;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::collaborators::ThresholdProvider;
use crate::error::EngineResult;

/// Default lifetime of a cached threshold set.
pub const DEFAULT_THRESHOLD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    config: ThresholdConfig,
    fetched_at: Instant,
}

/// Caches the thresholds returned by an inner provider for `ttl`.
///
/// Failed fetches are returned as-is and leave the cache empty.
pub struct CachedThresholds<P> {
    inner: P,
    ttl: Duration,
    entry: RwLock<Option<Entry>>,
}

impl<P: ThresholdProvider> CachedThresholds<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Drop the cached value so the next read goes to the inner provider.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
        tracing::debug!("Alert threshold cache invalidated");
    }

    async fn cached(&self) -> Option<ThresholdConfig> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.config)
    }
}

#[async_trait]
impl<P: ThresholdProvider> ThresholdProvider for CachedThresholds<P> {
    async fn alert_thresholds(&self) -> EngineResult<ThresholdConfig> {
        if let Some(config) = self.cached().await {
            return Ok(config);
        }

        let config = self.inner.alert_thresholds().await?;
        *self.entry.write().await = Some(Entry {
            config,
            fetched_at: Instant::now(),
        });
        tracing::debug!(
            tier2_min = config.tier2_min,
            tier2_max = config.tier2_max,
            tier3_min = config.tier3_min,
            "Alert thresholds refreshed",
        );
        Ok(config)
    }
}
