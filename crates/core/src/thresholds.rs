//! Score-to-tier boundaries for the composite risk score.
//!
//! The boundaries are stored as a system setting and read fresh on every
//! recomputation. They are assumed monotonic and non-overlapping; nothing
//! here validates that.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Key of the system setting holding the alert thresholds.
pub const ALERT_THRESHOLDS_KEY: &str = "alert_thresholds";

/// Three-level risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTier {
    Normal,
    Warning,
    Critical,
}

impl AlertTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Tier boundaries as stored in the `alert_thresholds` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(rename = "tier_2_min")]
    pub tier2_min: i32,
    #[serde(rename = "tier_2_max")]
    pub tier2_max: i32,
    #[serde(rename = "tier_3_min")]
    pub tier3_min: i32,
}

impl ThresholdConfig {
    /// Parse the JSON value of the `alert_thresholds` setting.
    pub fn from_setting(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            CoreError::Configuration(format!("malformed {ALERT_THRESHOLDS_KEY} setting: {e}"))
        })
    }

    /// Classify a risk score.
    ///
    /// The warning band is checked first; a score that falls in neither the
    /// warning band nor at/above `tier3_min` is normal.
    pub fn classify(&self, score: u8) -> AlertTier {
        let score = i32::from(score);
        if self.tier2_min <= score && score <= self.tier2_max {
            AlertTier::Warning
        } else if score >= self.tier3_min {
            AlertTier::Critical
        } else {
            AlertTier::Normal
        }
    }
}
