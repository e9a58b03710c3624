//! Typed status objects produced by the three telemetry feeds.
//!
//! Each producer persists its raw reading, derives one of these statuses and
//! hands it to the state registry wrapped in a [`SourceUpdate`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Classification emitted by the visual blockage classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockageLevel {
    Clear,
    Partial,
    Blocked,
}

impl BlockageLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Partial => "partial",
            Self::Blocked => "blocked",
        }
    }
}

impl FromStr for BlockageLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(Self::Clear),
            "partial" => Ok(Self::Partial),
            "blocked" => Ok(Self::Blocked),
            other => Err(CoreError::Validation(format!(
                "unknown blockage status '{other}', expected clear, partial or blocked"
            ))),
        }
    }
}

impl fmt::Display for BlockageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of water-level movement between consecutive sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

impl FromStr for Trend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(Self::Rising),
            "falling" => Ok(Self::Falling),
            "stable" => Ok(Self::Stable),
            other => Err(CoreError::Validation(format!("unknown trend '{other}'"))),
        }
    }
}

/// The three independently-timed telemetry feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Blockage,
    WaterLevel,
    Weather,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::WaterLevel, Self::Blockage, Self::Weather];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blockage => "blockage",
            Self::WaterLevel => "water_level",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status payloads
// ---------------------------------------------------------------------------

/// Latest verdict of the blockage classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockageStatus {
    pub status: BlockageLevel,
    pub observed_at: Timestamp,
}

/// Latest water-level observation, already enriched with trend and the
/// percentage of the device's critical threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLevelStatus {
    pub water_level_cm: f64,
    /// Centimetres gained since the previous reading (negative when falling).
    pub change_rate: f64,
    pub critical_percentage: f64,
    pub trend: Trend,
    pub observed_at: Timestamp,
}

/// Latest weather-feed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStatus {
    pub precipitation_mm: f64,
    /// Human-readable condition label (e.g. `"Rain"`).
    pub condition: String,
    pub observed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// SourceUpdate
// ---------------------------------------------------------------------------

/// One update from one source, dispatched to a location's fusion state.
///
/// Each variant replaces exactly one slot; there is no "maybe update" form.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceUpdate {
    Blockage(BlockageStatus),
    WaterLevel(WaterLevelStatus),
    Weather(WeatherStatus),
}

impl SourceUpdate {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Blockage(_) => SourceKind::Blockage,
            Self::WaterLevel(_) => SourceKind::WaterLevel,
            Self::Weather(_) => SourceKind::Weather,
        }
    }

    pub fn observed_at(&self) -> Timestamp {
        match self {
            Self::Blockage(s) => s.observed_at,
            Self::WaterLevel(s) => s.observed_at,
            Self::Weather(s) => s.observed_at,
        }
    }
}

impl From<BlockageStatus> for SourceUpdate {
    fn from(status: BlockageStatus) -> Self {
        Self::Blockage(status)
    }
}

impl From<WaterLevelStatus> for SourceUpdate {
    fn from(status: WaterLevelStatus) -> Self {
        Self::WaterLevel(status)
    }
}

impl From<WeatherStatus> for SourceUpdate {
    fn from(status: WeatherStatus) -> Self {
        Self::Weather(status)
    }
}
