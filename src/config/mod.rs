//! Configuration management module

pub mod settings;
pub mod validation;

pub use settings::{
    ApiConfig, BotConfig, DatabaseConfig, LoggingConfig, RobloxConfig, Settings, SweepConfig,
};
