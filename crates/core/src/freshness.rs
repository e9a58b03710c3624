//! Freshness windows for persisted readings.
//!
//! Every source has a grace window (reading is current) and a wider warning
//! window (reading is shown but flagged stale). Beyond the warning window the
//! reading is treated as unusable.
//!
//! # Clock injection
//! The `*_at` functions take `now` explicitly so tests stay deterministic.

use chrono::{Duration, Utc};

use crate::status::SourceKind;
use crate::types::Timestamp;

/// How usable a persisted reading is at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Age within the grace window.
    Fresh,
    /// Older than the grace window but within the warning window.
    Stale,
    /// Older than the warning window.
    Expired,
}

/// Grace and warning windows for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceWindow {
    pub grace: Duration,
    pub warning: Duration,
}

impl SourceWindow {
    pub fn from_minutes(grace: i64, warning: i64) -> Self {
        Self {
            grace: Duration::minutes(grace),
            warning: Duration::minutes(warning),
        }
    }

    /// Classify a reading observed at `observed_at`.
    ///
    /// Boundaries are inclusive: an age exactly equal to the grace window is
    /// still fresh. Readings dated in the future count as fresh.
    pub fn classify_at(&self, observed_at: Timestamp, now: Timestamp) -> Freshness {
        let age = now.signed_duration_since(observed_at);
        if age <= self.grace {
            Freshness::Fresh
        } else if age <= self.warning {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    pub fn classify(&self, observed_at: Timestamp) -> Freshness {
        self.classify_at(observed_at, Utc::now())
    }

    /// Whether a reading may seed fusion state at bootstrap.
    pub fn admits_at(&self, observed_at: Timestamp, now: Timestamp) -> bool {
        self.classify_at(observed_at, now) == Freshness::Fresh
    }
}

/// Windows for all three sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceWindows {
    pub water_level: SourceWindow,
    pub blockage: SourceWindow,
    pub weather: SourceWindow,
}

impl GraceWindows {
    pub fn for_source(&self, kind: SourceKind) -> SourceWindow {
        match kind {
            SourceKind::WaterLevel => self.water_level,
            SourceKind::Blockage => self.blockage,
            SourceKind::Weather => self.weather,
        }
    }
}

impl Default for GraceWindows {
    /// Sensor readings arrive every minute or so, classifier results every
    /// two minutes, and the weather feed hourly.
    fn default() -> Self {
        Self {
            water_level: SourceWindow::from_minutes(4, 8),
            blockage: SourceWindow::from_minutes(5, 10),
            weather: SourceWindow::from_minutes(65, 130),
        }
    }
}
