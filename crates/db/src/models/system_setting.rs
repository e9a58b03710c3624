use serde::Serialize;
use sqlx::FromRow;

/// A row from the `system_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemSetting {
    pub key: String,
    pub json_value: serde_json::Value,
}
