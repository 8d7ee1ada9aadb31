//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub roblox: RobloxConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Moderators allowed to use the management commands.
    pub admin_ids: Vec<i64>,
    /// Chat that receives KOS notifications; notifications are disabled
    /// when absent.
    pub notify_chat_id: Option<i64>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Key for the at-rest MACs over auth codes and session tokens.
    #[serde(default)]
    pub shared_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,
    #[serde(default = "default_admin_session_ttl_minutes")]
    pub admin_session_ttl_minutes: i64,
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

/// Roblox user-directory API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobloxConfig {
    #[serde(default = "default_users_api_url")]
    pub users_api_url: String,
    #[serde(default = "default_thumbnails_api_url")]
    pub thumbnails_api_url: String,
    #[serde(default = "default_roblox_timeout")]
    pub timeout_seconds: u64,
}

/// Expiry sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval")]
    pub interval_minutes: u64,
    /// Window used by the "expiring soon" filter and stats bucket.
    #[serde(default = "default_expiring_window")]
    pub expiring_window_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_path")]
    pub file_path: String,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_code_ttl_minutes() -> i64 {
    60
}

fn default_admin_session_ttl_minutes() -> i64 {
    30
}

fn default_rate_limit_per_minute() -> u32 {
    60
}

fn default_users_api_url() -> String {
    "https://users.roblox.com".to_string()
}

fn default_thumbnails_api_url() -> String {
    "https://thumbnails.roblox.com".to_string()
}

fn default_roblox_timeout() -> u64 {
    5
}

fn default_sweep_interval() -> u64 {
    15
}

fn default_expiring_window() -> i64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_path() -> String {
    "./logs".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            shared_secret: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
            code_ttl_minutes: default_code_ttl_minutes(),
            admin_session_ttl_minutes: default_admin_session_ttl_minutes(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

impl Default for RobloxConfig {
    fn default() -> Self {
        Self {
            users_api_url: default_users_api_url(),
            thumbnails_api_url: default_thumbnails_api_url(),
            timeout_seconds: default_roblox_timeout(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_sweep_interval(),
            expiring_window_days: default_expiring_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_path(),
        }
    }
}

impl Settings {
    /// Load settings from the optional `config` file plus `KOS_*`
    /// environment overrides.
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("KOS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::KosError> {
        super::validation::validate_settings(self)
    }
}
