//! Wire envelope pushed to dashboard subscribers.
//!
//! ```text
//! {
//!   "type": "sensor_update",
//!   "data": {
//!     "status": "success" | "warning" | "error",
//!     "message": "...",
//!     "sensor_reading": { ... } | null
//!   }
//! }
//! ```
//!
//! The payload key depends on the event type, see [`EventKind::payload_key`].

use floodwatch_core::freshness::Freshness;
use floodwatch_core::status::SourceKind;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const MESSAGE_OK: &str = "Retrieved successfully";

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The four event names a subscriber can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SensorUpdate,
    BlockageDetectionUpdate,
    WeatherUpdate,
    FusionAnalysisUpdate,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SensorUpdate => "sensor_update",
            Self::BlockageDetectionUpdate => "blockage_detection_update",
            Self::WeatherUpdate => "weather_update",
            Self::FusionAnalysisUpdate => "fusion_analysis_update",
        }
    }

    /// Name of the field inside `data` that carries the payload.
    pub fn payload_key(self) -> &'static str {
        match self {
            Self::SensorUpdate => "sensor_reading",
            Self::BlockageDetectionUpdate => "blockage_status",
            Self::WeatherUpdate => "weather_condition",
            Self::FusionAnalysisUpdate => "fusion_analysis",
        }
    }

    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::WaterLevel => Self::SensorUpdate,
            SourceKind::Blockage => Self::BlockageDetectionUpdate,
            SourceKind::Weather => Self::WeatherUpdate,
        }
    }

    fn stale_message(self) -> &'static str {
        match self {
            Self::SensorUpdate => "Latest sensor data is stale.",
            Self::BlockageDetectionUpdate => "Latest blockage detection is stale.",
            Self::WeatherUpdate => "Latest weather data is stale.",
            Self::FusionAnalysisUpdate => "Latest fusion analysis is stale.",
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            Self::SensorUpdate => "No recent sensor data available.",
            Self::BlockageDetectionUpdate => "No recent blockage detection data available.",
            Self::WeatherUpdate => "No recent weather data available.",
            Self::FusionAnalysisUpdate => "No fusion analysis available.",
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryStatus
// ---------------------------------------------------------------------------

/// Quality flag carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Value present and current.
    Success,
    /// Value present but older than its grace window.
    Warning,
    /// No usable value.
    Error,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl From<Freshness> for DeliveryStatus {
    fn from(freshness: Freshness) -> Self {
        match freshness {
            Freshness::Fresh => Self::Success,
            Freshness::Stale => Self::Warning,
            Freshness::Expired => Self::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One message for subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub kind: EventKind,
    pub status: DeliveryStatus,
    pub message: String,
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(kind: EventKind, status: DeliveryStatus, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            payload: None,
        }
    }

    /// A live update carrying a current value.
    pub fn success(kind: EventKind, payload: Value) -> Self {
        Self::new(kind, DeliveryStatus::Success, MESSAGE_OK).with_payload(payload)
    }

    /// Envelope for a persisted reading classified by freshness.
    ///
    /// An absent or expired reading yields an `error` envelope with a null
    /// payload; a stale one keeps its payload but is flagged `warning`.
    pub fn for_reading(kind: EventKind, reading: Option<(Freshness, Value)>) -> Self {
        match reading {
            Some((Freshness::Fresh, payload)) => Self::success(kind, payload),
            Some((Freshness::Stale, payload)) => {
                Self::new(kind, DeliveryStatus::Warning, kind.stale_message()).with_payload(payload)
            }
            Some((Freshness::Expired, _)) | None => {
                Self::new(kind, DeliveryStatus::Error, kind.missing_message())
            }
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        data.insert("status".into(), Value::from(self.status.as_str()));
        data.insert("message".into(), Value::from(self.message.clone()));
        data.insert(
            self.kind.payload_key().into(),
            self.payload.clone().unwrap_or(Value::Null),
        );
        json!({
            "type": self.kind.as_str(),
            "data": Value::Object(data),
        })
    }

    /// Serialized form sent over the wire.
    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}
