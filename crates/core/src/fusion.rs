//! Fusion scoring engine.
//!
//! Combines the latest blockage, water-level and weather statuses of one
//! location into a single [`FusionData`] judgement. Pure logic; the caller
//! fetches the [`ThresholdConfig`] and decides what to do with the result.
//!
//! Score budget: blockage 0-30, water level 0-50 (45 band + 5 rising bonus),
//! weather 0-20. The maximum is therefore exactly 100.

use serde::{Deserialize, Serialize};

use crate::status::{
    BlockageLevel, BlockageStatus, SourceUpdate, Trend, WaterLevelStatus, WeatherStatus,
};
use crate::thresholds::{AlertTier, ThresholdConfig};

// ---------------------------------------------------------------------------
// Condition texts
// ---------------------------------------------------------------------------

pub const CONDITION_BLOCKED: &str = "Waterway is BLOCKED - Immediate action required.";
pub const CONDITION_PARTIAL: &str = "Partial blockage detected in waterway.";
pub const CONDITION_NEARING_CRITICAL: &str = "Water level nearing critical threshold.";
pub const CONDITION_AT_CRITICAL: &str = "Water level at CRITICAL threshold!";
pub const CONDITION_ABOVE_CRITICAL: &str = "Water level above CRITICAL threshold!";
pub const CONDITION_RISING_QUICKLY: &str = "Water level rising quickly.";
pub const CONDITION_RISING: &str = "Water level rising.";
pub const CONDITION_LIGHT_RAIN: &str = "Light to moderate rainfall detected.";
pub const CONDITION_HEAVY_RAIN: &str = "Heavy rainfall detected.";
pub const CONDITION_MULTIPLE_CRITICAL: &str = "MULTIPLE CRITICAL FACTORS";
pub const CONDITION_ROUTINE_MONITORING: &str = "Conditions normal - Continue routine monitoring";

/// Shown when the tier is normal and nothing fired.
pub const REASSURANCE_CONDITIONS: [&str; 3] = [
    "All systems operating within normal parameters",
    "Drainage system clear and functioning",
    "Water levels within safe range",
];

/// Points for a blocked waterway.
const BLOCKED_POINTS: u8 = 30;
const PARTIAL_POINTS: u8 = 20;
const RISING_BONUS: u8 = 5;

/// `change_rate` (cm per reading) at which "rising quickly" is reported.
const RISING_QUICKLY_RATE: f64 = 2.0;
const RISING_RATE: f64 = 1.5;

/// Inputs for the critical-combination marker.
const CRITICAL_PERCENTAGE: f64 = 90.0;
const HEAVY_RAIN_MM: f64 = 7.5;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Composite judgement for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionData {
    pub alert_tier: AlertTier,
    /// Always within `0..=100`.
    pub risk_score: u8,
    pub triggered_conditions: Vec<String>,
}

impl Default for FusionData {
    fn default() -> Self {
        Self {
            alert_tier: AlertTier::Normal,
            risk_score: 0,
            triggered_conditions: Vec::new(),
        }
    }
}

/// Judgement bundled with the three source values it was computed from.
///
/// Only exists once every source has reported at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionAnalysisData {
    pub fusion_data: FusionData,
    pub blockage: BlockageStatus,
    pub water_level: WaterLevelStatus,
    pub weather: WeatherStatus,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score the given (possibly partial) inputs.
///
/// A missing source contributes zero points and no conditions. The result
/// depends only on the arguments.
pub fn score(
    blockage: Option<&BlockageStatus>,
    water_level: Option<&WaterLevelStatus>,
    weather: Option<&WeatherStatus>,
    thresholds: &ThresholdConfig,
) -> FusionData {
    let mut score: u8 = 0;
    let mut conditions: Vec<String> = Vec::new();

    if let Some(blockage) = blockage {
        match blockage.status {
            BlockageLevel::Blocked => {
                score += BLOCKED_POINTS;
                conditions.push(CONDITION_BLOCKED.to_string());
            }
            BlockageLevel::Partial => {
                score += PARTIAL_POINTS;
                conditions.push(CONDITION_PARTIAL.to_string());
            }
            BlockageLevel::Clear => {}
        }
    }

    if let Some(water) = water_level {
        let (points, condition) = water_band(water.critical_percentage);
        score += points;
        if let Some(condition) = condition {
            conditions.push(condition.to_string());
        }

        if water.trend == Trend::Rising {
            score += RISING_BONUS;
        }

        // Informational only.
        if water.change_rate >= RISING_QUICKLY_RATE {
            conditions.push(CONDITION_RISING_QUICKLY.to_string());
        } else if water.change_rate >= RISING_RATE {
            conditions.push(CONDITION_RISING.to_string());
        }
    }

    if let Some(weather) = weather {
        let (points, condition) = weather_band(weather.precipitation_mm);
        score += points;
        if let Some(condition) = condition {
            conditions.push(condition.to_string());
        }
    }

    let critical_combination = matches!(blockage, Some(b) if b.status == BlockageLevel::Blocked)
        && matches!(water_level, Some(w) if w.critical_percentage >= CRITICAL_PERCENTAGE)
        && matches!(weather, Some(w) if w.precipitation_mm >= HEAVY_RAIN_MM);
    if critical_combination {
        conditions.push(CONDITION_MULTIPLE_CRITICAL.to_string());
    }

    let alert_tier = thresholds.classify(score);

    if alert_tier == AlertTier::Normal {
        if conditions.is_empty() {
            conditions = REASSURANCE_CONDITIONS.iter().map(|c| c.to_string()).collect();
        } else {
            conditions.insert(0, CONDITION_ROUTINE_MONITORING.to_string());
        }
    }

    FusionData {
        alert_tier,
        risk_score: score,
        triggered_conditions: conditions,
    }
}

/// Points and condition for a water level expressed as % of critical.
fn water_band(critical_percentage: f64) -> (u8, Option<&'static str>) {
    match critical_percentage {
        p if p < 50.0 => (10, None),
        p if p < 75.0 => (20, None),
        p if p < 90.0 => (30, None),
        p if p < 100.0 => (45, Some(CONDITION_NEARING_CRITICAL)),
        p if p == 100.0 => (45, Some(CONDITION_AT_CRITICAL)),
        _ => (45, Some(CONDITION_ABOVE_CRITICAL)),
    }
}

/// Points and condition for hourly precipitation in millimetres.
fn weather_band(precipitation_mm: f64) -> (u8, Option<&'static str>) {
    match precipitation_mm {
        p if p < 1.0 => (0, None),
        p if p < 2.55 => (8, Some(CONDITION_LIGHT_RAIN)),
        p if p < HEAVY_RAIN_MM => (15, None),
        _ => (20, Some(CONDITION_HEAVY_RAIN)),
    }
}

// ---------------------------------------------------------------------------
// FusionState
// ---------------------------------------------------------------------------

/// Per-location aggregate: the latest value of each source plus the last
/// computed judgement.
///
/// Slots are replaced last-write-wins, with no check against the value's own
/// `observed_at`. The judgement is recomputed only by [`FusionState::recompute`],
/// which callers run after every slot change.
#[derive(Debug, Clone, Default)]
pub struct FusionState {
    blockage: Option<BlockageStatus>,
    water_level: Option<WaterLevelStatus>,
    weather: Option<WeatherStatus>,
    fusion_data: FusionData,
    analysis: Option<FusionAnalysisData>,
}

impl FusionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot matching the update's source.
    pub fn apply(&mut self, update: SourceUpdate) {
        match update {
            SourceUpdate::Blockage(status) => self.blockage = Some(status),
            SourceUpdate::WaterLevel(status) => self.water_level = Some(status),
            SourceUpdate::Weather(status) => self.weather = Some(status),
        }
    }

    /// Recompute the judgement from the current slots.
    ///
    /// The analysis bundle is refreshed only when all three slots are
    /// populated; until then it stays absent.
    pub fn recompute(&mut self, thresholds: &ThresholdConfig) -> &FusionData {
        self.fusion_data = score(
            self.blockage.as_ref(),
            self.water_level.as_ref(),
            self.weather.as_ref(),
            thresholds,
        );

        if let (Some(blockage), Some(water_level), Some(weather)) =
            (&self.blockage, &self.water_level, &self.weather)
        {
            self.analysis = Some(FusionAnalysisData {
                fusion_data: self.fusion_data.clone(),
                blockage: blockage.clone(),
                water_level: water_level.clone(),
                weather: weather.clone(),
            });
        }

        &self.fusion_data
    }

    pub fn fusion_data(&self) -> &FusionData {
        &self.fusion_data
    }

    pub fn analysis(&self) -> Option<&FusionAnalysisData> {
        self.analysis.as_ref()
    }

    pub fn blockage(&self) -> Option<&BlockageStatus> {
        self.blockage.as_ref()
    }

    pub fn water_level(&self) -> Option<&WaterLevelStatus> {
        self.water_level.as_ref()
    }

    pub fn weather(&self) -> Option<&WeatherStatus> {
        self.weather.as_ref()
    }

    /// `true` once every source has reported at least once.
    pub fn is_complete(&self) -> bool {
        self.blockage.is_some() && self.water_level.is_some() && self.weather.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::Timestamp;

    fn at() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 12, 14, 0, 0).unwrap()
    }

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            tier2_min: 45,
            tier2_max: 75,
            tier3_min: 76,
        }
    }

    fn blockage(status: BlockageLevel) -> BlockageStatus {
        BlockageStatus {
            status,
            observed_at: at(),
        }
    }

    fn water(critical_percentage: f64, trend: Trend, change_rate: f64) -> WaterLevelStatus {
        WaterLevelStatus {
            water_level_cm: critical_percentage,
            change_rate,
            critical_percentage,
            trend,
            observed_at: at(),
        }
    }

    fn weather(precipitation_mm: f64) -> WeatherStatus {
        WeatherStatus {
            precipitation_mm,
            condition: "Rain".to_string(),
            observed_at: at(),
        }
    }

    fn water_points(critical_percentage: f64) -> u8 {
        let w = water(critical_percentage, Trend::Stable, 0.0);
        score(None, Some(&w), None, &thresholds()).risk_score
    }

    #[test]
    fn no_inputs_is_normal_with_reassurance() {
        let data = score(None, None, None, &thresholds());
        assert_eq!(data.risk_score, 0);
        assert_eq!(data.alert_tier, AlertTier::Normal);
        assert_eq!(data.triggered_conditions, REASSURANCE_CONDITIONS.to_vec());
    }

    #[test]
    fn scenario_clear_low_water_no_rain() {
        let b = blockage(BlockageLevel::Clear);
        let w = water(40.0, Trend::Stable, 0.0);
        let r = weather(0.0);

        let data = score(Some(&b), Some(&w), Some(&r), &thresholds());

        assert_eq!(data.risk_score, 10);
        assert_eq!(data.alert_tier, AlertTier::Normal);
        assert_eq!(data.triggered_conditions, REASSURANCE_CONDITIONS.to_vec());
    }

    #[test]
    fn scenario_all_factors_critical() {
        let b = blockage(BlockageLevel::Blocked);
        let w = water(95.0, Trend::Rising, 2.5);
        let r = weather(8.0);

        let data = score(Some(&b), Some(&w), Some(&r), &thresholds());

        assert_eq!(data.risk_score, 100);
        assert_eq!(data.alert_tier, AlertTier::Critical);
        assert_eq!(
            data.triggered_conditions,
            vec![
                CONDITION_BLOCKED,
                CONDITION_NEARING_CRITICAL,
                CONDITION_RISING_QUICKLY,
                CONDITION_HEAVY_RAIN,
                CONDITION_MULTIPLE_CRITICAL,
            ]
        );
    }

    #[test]
    fn water_band_increases_across_boundaries() {
        assert_eq!(water_points(49.0), 10);
        assert_eq!(water_points(51.0), 20);
        assert_eq!(water_points(74.0), 20);
        assert_eq!(water_points(76.0), 30);
        assert_eq!(water_points(89.0), 30);
        assert_eq!(water_points(91.0), 45);
        assert_eq!(water_points(100.0), 45);
        assert_eq!(water_points(140.0), 45);
    }

    #[test]
    fn water_conditions_distinguish_near_at_and_above_critical() {
        let cond = |p: f64| {
            let w = water(p, Trend::Stable, 0.0);
            score(None, Some(&w), None, &thresholds()).triggered_conditions
        };
        assert!(cond(95.0).contains(&CONDITION_NEARING_CRITICAL.to_string()));
        assert!(cond(100.0).contains(&CONDITION_AT_CRITICAL.to_string()));
        assert!(cond(100.5).contains(&CONDITION_ABOVE_CRITICAL.to_string()));
    }

    #[test]
    fn rising_bonus_is_independent_of_change_rate() {
        let w = water(60.0, Trend::Rising, 0.0);
        let data = score(None, Some(&w), None, &thresholds());
        assert_eq!(data.risk_score, 25);
    }

    #[test]
    fn change_rate_conditions_are_informational() {
        let slow = water(60.0, Trend::Stable, 1.5);
        let data = score(None, Some(&slow), None, &thresholds());
        assert_eq!(data.risk_score, 20);
        assert!(data.triggered_conditions.contains(&CONDITION_RISING.to_string()));

        let fast = water(60.0, Trend::Stable, 2.0);
        let data = score(None, Some(&fast), None, &thresholds());
        assert_eq!(data.risk_score, 20);
        assert!(data.triggered_conditions.contains(&CONDITION_RISING_QUICKLY.to_string()));
        assert!(!data.triggered_conditions.contains(&CONDITION_RISING.to_string()));
    }

    #[test]
    fn weather_bands() {
        let points = |mm: f64| score(None, None, Some(&weather(mm)), &thresholds()).risk_score;
        assert_eq!(points(0.0), 0);
        assert_eq!(points(0.99), 0);
        assert_eq!(points(1.0), 8);
        assert_eq!(points(2.54), 8);
        assert_eq!(points(2.55), 15);
        assert_eq!(points(7.49), 15);
        assert_eq!(points(7.5), 20);
        assert_eq!(points(40.0), 20);
    }

    #[test]
    fn normal_tier_with_conditions_prepends_routine_monitoring() {
        let b = blockage(BlockageLevel::Partial);
        let data = score(Some(&b), None, None, &thresholds());
        assert_eq!(data.risk_score, 20);
        assert_eq!(data.alert_tier, AlertTier::Normal);
        assert_eq!(
            data.triggered_conditions,
            vec![CONDITION_ROUTINE_MONITORING, CONDITION_PARTIAL]
        );
    }

    #[test]
    fn warning_tier_keeps_conditions_unchanged() {
        let b = blockage(BlockageLevel::Blocked);
        let w = water(60.0, Trend::Stable, 0.0);
        let data = score(Some(&b), Some(&w), None, &thresholds());
        assert_eq!(data.risk_score, 50);
        assert_eq!(data.alert_tier, AlertTier::Warning);
        assert_eq!(data.triggered_conditions, vec![CONDITION_BLOCKED]);
    }

    #[test]
    fn critical_marker_requires_all_three_factors() {
        let b = blockage(BlockageLevel::Blocked);
        let w = water(95.0, Trend::Stable, 0.0);
        let light = weather(7.4);
        let data = score(Some(&b), Some(&w), Some(&light), &thresholds());
        assert!(!data
            .triggered_conditions
            .contains(&CONDITION_MULTIPLE_CRITICAL.to_string()));
    }

    #[test]
    fn score_never_exceeds_one_hundred() {
        for level in [BlockageLevel::Clear, BlockageLevel::Partial, BlockageLevel::Blocked] {
            for pct in [0.0, 49.9, 50.0, 80.0, 90.0, 100.0, 250.0] {
                for trend in [Trend::Rising, Trend::Falling, Trend::Stable] {
                    for mm in [0.0, 1.0, 3.0, 7.5, 120.0] {
                        let b = blockage(level);
                        let w = water(pct, trend, 3.0);
                        let r = weather(mm);
                        let data = score(Some(&b), Some(&w), Some(&r), &thresholds());
                        assert!(data.risk_score <= 100, "score {} out of range", data.risk_score);
                    }
                }
            }
        }
    }

    #[test]
    fn analysis_absent_until_all_sources_reported() {
        let mut state = FusionState::new();
        state.apply(SourceUpdate::Blockage(blockage(BlockageLevel::Clear)));
        state.apply(SourceUpdate::WaterLevel(water(40.0, Trend::Stable, 0.0)));
        state.recompute(&thresholds());
        assert!(state.analysis().is_none());
        assert_eq!(state.fusion_data().risk_score, 10);

        state.apply(SourceUpdate::Weather(weather(3.0)));
        state.recompute(&thresholds());
        let analysis = state.analysis().expect("all sources present");
        assert_eq!(analysis.fusion_data.risk_score, 25);
        assert_eq!(analysis.weather.precipitation_mm, 3.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut state = FusionState::new();
        state.apply(SourceUpdate::Blockage(blockage(BlockageLevel::Partial)));
        state.apply(SourceUpdate::Weather(weather(2.0)));

        let first = state.recompute(&thresholds()).clone();
        let second = state.recompute(&thresholds()).clone();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn apply_is_last_write_wins_regardless_of_timestamp() {
        let mut state = FusionState::new();
        let newer = BlockageStatus {
            status: BlockageLevel::Blocked,
            observed_at: at() + chrono::Duration::minutes(10),
        };
        let older = BlockageStatus {
            status: BlockageLevel::Clear,
            observed_at: at(),
        };
        state.apply(SourceUpdate::Blockage(newer));
        state.apply(SourceUpdate::Blockage(older.clone()));
        assert_eq!(state.blockage(), Some(&older));
    }

    #[test]
    fn tier_follows_updated_thresholds() {
        let mut state = FusionState::new();
        state.apply(SourceUpdate::Blockage(blockage(BlockageLevel::Blocked)));
        assert_eq!(state.recompute(&thresholds()).alert_tier, AlertTier::Normal);

        let lowered = ThresholdConfig {
            tier2_min: 20,
            tier2_max: 29,
            tier3_min: 30,
        };
        assert_eq!(state.recompute(&lowered).alert_tier, AlertTier::Critical);
    }
}
