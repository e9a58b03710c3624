//! Repository for the `system_settings` table.

use sqlx::PgPool;

use crate::models::system_setting::SystemSetting;

pub struct SystemSettingRepo;

impl SystemSettingRepo {
    pub async fn find(pool: &PgPool, key: &str) -> Result<Option<SystemSetting>, sqlx::Error> {
        sqlx::query_as::<_, SystemSetting>(
            "SELECT key, json_value FROM system_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await
    }

    /// JSON value for `key`, or `None` when unset.
    pub async fn get_value(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        Ok(Self::find(pool, key).await?.map(|s| s.json_value))
    }
}
