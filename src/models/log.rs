//! Operational log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Log categories written by the services.
pub mod category {
    pub const SERVICE: &str = "service";
    pub const SYSTEM: &str = "system";
    pub const AUTH: &str = "auth";
    pub const ADMIN: &str = "admin";
}

/// Log levels stored alongside each line.
pub mod level {
    pub const INFO: &str = "info";
    pub const WARN: &str = "warn";
    pub const ERROR: &str = "error";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogRecord {
    pub id: i64,
    pub level: String,
    pub category: String,
    pub message: String,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}
