//! Water-level derivation for the sensor feed.
//!
//! Turns a raw ultrasonic distance reading into a [`WaterLevelStatus`] using
//! the sensor device's calibration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{Trend, WaterLevelStatus};
use crate::types::Timestamp;

/// Change (cm) beyond which a reading counts as rising or falling.
const TREND_DEADBAND_CM: f64 = 1.0;

/// Calibration stored on each sensor device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Distance from the sensor head to the channel bed, in cm.
    pub installation_height: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
}

impl SensorConfig {
    pub fn from_setting(value: &serde_json::Value) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Configuration(format!("malformed sensor_config: {e}")))?;
        if config.critical_threshold <= 0.0 {
            return Err(CoreError::Configuration(
                "sensor_config.critical_threshold must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    /// Water depth for a raw sensor-to-surface distance.
    pub fn water_level_cm(&self, raw_distance_cm: f64) -> f64 {
        self.installation_height - raw_distance_cm
    }

    pub fn alert_level(&self, water_level_cm: f64) -> SensorAlertLevel {
        if water_level_cm >= self.critical_threshold {
            SensorAlertLevel::Critical
        } else if water_level_cm >= self.warning_threshold {
            SensorAlertLevel::Warning
        } else {
            SensorAlertLevel::Normal
        }
    }

    /// Water level as a percentage of the critical threshold, one decimal.
    pub fn critical_percentage(&self, water_level_cm: f64) -> f64 {
        round_to(water_level_cm / self.critical_threshold * 100.0, 1)
    }
}

/// Per-device level classification, independent of the fused tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorAlertLevel {
    Normal,
    Warning,
    Critical,
}

/// Centimetres gained since the previous reading, two decimals.
pub fn change_rate(current_cm: f64, previous_cm: Option<f64>) -> f64 {
    match previous_cm {
        Some(prev) => round_to(current_cm - prev, 2),
        None => 0.0,
    }
}

pub fn trend_for(change_rate: f64) -> Trend {
    if change_rate > TREND_DEADBAND_CM {
        Trend::Rising
    } else if change_rate < -TREND_DEADBAND_CM {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

impl WaterLevelStatus {
    /// Derive the status for a reading given the previous reading's level.
    pub fn derive(
        water_level_cm: f64,
        previous_cm: Option<f64>,
        config: &SensorConfig,
        observed_at: Timestamp,
    ) -> Self {
        let change_rate = change_rate(water_level_cm, previous_cm);
        Self {
            water_level_cm,
            change_rate,
            critical_percentage: config.critical_percentage(water_level_cm),
            trend: trend_for(change_rate),
            observed_at,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
