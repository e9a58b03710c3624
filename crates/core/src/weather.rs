//! WMO weather-code interpretation for the weather feed.

use crate::status::WeatherStatus;
use crate::types::Timestamp;

/// Condition label for a WMO weather interpretation code.
pub fn condition_for_code(code: i32) -> &'static str {
    match code {
        0 => "Sunny",
        1 => "Mainly Clear",
        2..=3 => "Cloudy",
        45..=48 => "Foggy",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Showers",
        85..=86 => "Snow Showers",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Short description of an hourly precipitation amount.
pub fn describe_precipitation(precipitation_mm: f64) -> &'static str {
    match precipitation_mm {
        p if p <= 0.0 => "No rainfall detected",
        p if p <= 2.5 => "Light precipitation",
        p if p <= 10.0 => "Moderate rainfall intensity",
        p if p <= 50.0 => "Heavy rainfall detected",
        _ => "Extreme rainfall conditions",
    }
}

impl WeatherStatus {
    pub fn from_observation(precipitation_mm: f64, weather_code: i32, observed_at: Timestamp) -> Self {
        Self {
            precipitation_mm,
            condition: condition_for_code(weather_code).to_string(),
            observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn maps_code_ranges() {
        assert_eq!(condition_for_code(0), "Sunny");
        assert_eq!(condition_for_code(3), "Cloudy");
        assert_eq!(condition_for_code(63), "Rain");
        assert_eq!(condition_for_code(81), "Showers");
        assert_eq!(condition_for_code(96), "Thunderstorm");
        assert_eq!(condition_for_code(42), "Unknown");
    }

    #[test]
    fn describes_precipitation() {
        assert_eq!(describe_precipitation(0.0), "No rainfall detected");
        assert_eq!(describe_precipitation(2.5), "Light precipitation");
        assert_eq!(describe_precipitation(9.0), "Moderate rainfall intensity");
        assert_eq!(describe_precipitation(51.0), "Extreme rainfall conditions");
    }

    #[test]
    fn status_carries_condition_label() {
        let status = WeatherStatus::from_observation(4.2, 65, Utc::now());
        assert_eq!(status.condition, "Rain");
        assert_eq!(status.precipitation_mm, 4.2);
    }
}
