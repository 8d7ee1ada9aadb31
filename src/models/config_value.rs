//! Key-value bot configuration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Well-known configuration keys.
pub mod keys {
    pub const ADMIN_PASSWORD: &str = "admin_password";
    pub const BOT_ENABLED: &str = "bot_enabled";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConfigValue {
    pub key: String,
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
