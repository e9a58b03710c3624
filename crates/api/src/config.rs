use std::str::FromStr;
use std::time::Duration;

use floodwatch_core::error::CoreError;
use floodwatch_core::freshness::{GraceWindows, SourceWindow};
use floodwatch_engine::{RegistryConfig, UnknownLocationPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Result<Self, CoreError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: env_or("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30)?,
        })
    }
}

/// Tuning for the state registry and subscriber delivery.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub windows: GraceWindows,
    /// Bound on a single subscriber send.
    pub subscriber_send_timeout: Duration,
    /// Outbound queue length per WebSocket connection.
    pub subscriber_queue_capacity: usize,
    /// Command queue length per location worker.
    pub location_queue_capacity: usize,
    pub threshold_cache_ttl: Duration,
    pub unknown_location_policy: UnknownLocationPolicy,
}

impl FusionConfig {
    /// Load fusion settings from environment variables with defaults.
    ///
    /// | Env Var                              | Default  |
    /// |--------------------------------------|----------|
    /// | `SENSOR_GRACE_PERIOD_MINUTES`        | `4`      |
    /// | `SENSOR_WARNING_PERIOD_MINUTES`      | `8`      |
    /// | `DETECTION_GRACE_PERIOD_MINUTES`     | `5`      |
    /// | `DETECTION_WARNING_PERIOD_MINUTES`   | `10`     |
    /// | `WEATHER_GRACE_PERIOD_MINUTES`       | `65`     |
    /// | `WEATHER_WARNING_PERIOD_MINUTES`     | `130`    |
    /// | `SUBSCRIBER_SEND_TIMEOUT_MS`         | `2000`   |
    /// | `SUBSCRIBER_QUEUE_CAPACITY`          | `64`     |
    /// | `LOCATION_QUEUE_CAPACITY`            | `64`     |
    /// | `THRESHOLD_CACHE_TTL_SECS`           | `86400`  |
    /// | `UNKNOWN_LOCATION_POLICY`            | `ignore` |
    pub fn from_env() -> Result<Self, CoreError> {
        let windows = GraceWindows {
            water_level: window_from_env("SENSOR", 4, 8)?,
            blockage: window_from_env("DETECTION", 5, 10)?,
            weather: window_from_env("WEATHER", 65, 130)?,
        };

        let unknown_location_policy = match std::env::var("UNKNOWN_LOCATION_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => UnknownLocationPolicy::default(),
        };

        Ok(Self {
            windows,
            subscriber_send_timeout: Duration::from_millis(env_or("SUBSCRIBER_SEND_TIMEOUT_MS", 2000)?),
            subscriber_queue_capacity: env_or("SUBSCRIBER_QUEUE_CAPACITY", 64)?,
            location_queue_capacity: env_or("LOCATION_QUEUE_CAPACITY", 64)?,
            threshold_cache_ttl: Duration::from_secs(env_or("THRESHOLD_CACHE_TTL_SECS", 86_400)?),
            unknown_location_policy,
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            queue_capacity: self.location_queue_capacity,
            unknown_location_policy: self.unknown_location_policy,
            windows: self.windows,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            windows: GraceWindows::default(),
            subscriber_send_timeout: floodwatch_events::broadcaster::DEFAULT_SEND_TIMEOUT,
            subscriber_queue_capacity: 64,
            location_queue_capacity: floodwatch_engine::registry::DEFAULT_QUEUE_CAPACITY,
            threshold_cache_ttl: floodwatch_engine::cache::DEFAULT_THRESHOLD_TTL,
            unknown_location_policy: UnknownLocationPolicy::default(),
        }
    }
}

/// `<PREFIX>_GRACE_PERIOD_MINUTES` / `<PREFIX>_WARNING_PERIOD_MINUTES`.
fn window_from_env(prefix: &str, grace: i64, warning: i64) -> Result<SourceWindow, CoreError> {
    let grace = env_or(&format!("{prefix}_GRACE_PERIOD_MINUTES"), grace)?;
    let warning = env_or(&format!("{prefix}_WARNING_PERIOD_MINUTES"), warning)?;
    if warning < grace {
        return Err(CoreError::Configuration(format!(
            "{prefix}_WARNING_PERIOD_MINUTES ({warning}) must not be shorter than the grace period ({grace})"
        )));
    }
    Ok(SourceWindow::from_minutes(grace, warning))
}

fn env_or<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Configuration(format!("{key} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}
