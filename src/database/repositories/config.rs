//! Key-value bot configuration repository

use sqlx::PgPool;

use crate::models::ConfigValue;
use crate::utils::errors::KosError;

#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<ConfigValue>, KosError> {
        let value = sqlx::query_as::<_, ConfigValue>(
            "SELECT key, value, description, updated_at FROM bot_config WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// String value for a key, if present and a string.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, KosError> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.value.as_str().map(str::to_string)))
    }

    /// Boolean value for a key, falling back to the given default.
    pub async fn get_bool(&self, key: &str, default: bool) -> Result<bool, KosError> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.value.as_bool()).unwrap_or(default))
    }

    pub async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        description: Option<&str>,
    ) -> Result<ConfigValue, KosError> {
        let stored = sqlx::query_as::<_, ConfigValue>(
            r#"
            INSERT INTO bot_config (key, value, description, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value,
                          description = COALESCE(EXCLUDED.description, bot_config.description),
                          updated_at = NOW()
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}
