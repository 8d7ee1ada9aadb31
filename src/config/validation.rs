//! Configuration validation module
//!
//! Fails fast at startup when a required setting is absent or nonsensical.

use super::Settings;
use crate::utils::errors::{KosError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_api_config(&settings.api)?;
    validate_roblox_config(&settings.roblox)?;
    validate_sweep_config(&settings.sweep)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(KosError::Config("Bot token is required".to_string()));
    }

    if config.admin_ids.is_empty() {
        return Err(KosError::Config(
            "At least one admin ID must be configured".to_string(),
        ));
    }

    Ok(())
}

fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(KosError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(KosError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(KosError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

fn validate_api_config(config: &super::ApiConfig) -> Result<()> {
    if config.shared_secret.is_empty() {
        return Err(KosError::Config(
            "API shared secret is required".to_string(),
        ));
    }

    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(KosError::Config(format!(
            "Invalid API bind address: {}",
            config.bind_addr
        )));
    }

    if config.session_ttl_hours <= 0 || config.code_ttl_minutes <= 0 || config.admin_session_ttl_minutes <= 0 {
        return Err(KosError::Config(
            "Session and code lifetimes must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_roblox_config(config: &super::RobloxConfig) -> Result<()> {
    if config.users_api_url.is_empty() || config.thumbnails_api_url.is_empty() {
        return Err(KosError::Config(
            "Roblox API URLs are required".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(KosError::Config(
            "Roblox timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_sweep_config(config: &super::SweepConfig) -> Result<()> {
    if config.interval_minutes == 0 {
        return Err(KosError::Config(
            "Sweep interval must be greater than 0".to_string(),
        ));
    }

    if config.expiring_window_days <= 0 {
        return Err(KosError::Config(
            "Expiring window must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(KosError::Config("Log level is required".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, BotConfig, DatabaseConfig, LoggingConfig, RobloxConfig, SweepConfig};
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        Settings {
            bot: BotConfig {
                token: "123456:token".to_string(),
                admin_ids: vec![42],
                notify_chat_id: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/kos".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            api: ApiConfig {
                shared_secret: "secret".to_string(),
                ..ApiConfig::default()
            },
            roblox: RobloxConfig::default(),
            sweep: SweepConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn accepts_valid_settings() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn rejects_missing_bot_token() {
        let mut settings = valid_settings();
        settings.bot.token = String::new();
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }

    #[test]
    fn rejects_empty_admin_list() {
        let mut settings = valid_settings();
        settings.bot.admin_ids.clear();
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }

    #[test]
    fn rejects_missing_shared_secret() {
        let mut settings = valid_settings();
        settings.api.shared_secret = String::new();
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let mut settings = valid_settings();
        settings.api.bind_addr = "not-an-addr".to_string();
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        let mut settings = valid_settings();
        settings.sweep.interval_minutes = 0;
        assert_matches!(validate_settings(&settings), Err(KosError::Config(_)));
    }
}
