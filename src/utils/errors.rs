//! Error handling for Brotherhood-KOS
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the Brotherhood-KOS application
#[derive(Error, Debug)]
pub enum KosError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Roblox API error: {0}")]
    Roblox(#[from] RobloxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Intentionally carries no detail about which check failed.
    #[error("Authentication failed")]
    Auth,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Roblox user-directory API specific errors
#[derive(Error, Debug)]
pub enum RobloxError {
    #[error("Roblox API request failed: {0}")]
    RequestFailed(String),

    #[error("Roblox API timeout")]
    Timeout,

    #[error("Invalid Roblox response: {0}")]
    InvalidResponse(String),

    #[error("Roblox service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Brotherhood-KOS operations
pub type Result<T> = std::result::Result<T, KosError>;

impl KosError {
    /// Message safe to show to the end user in a chat reply.
    ///
    /// Database and upstream detail stays server-side; the taxonomy variants
    /// map to their user-visible wording.
    pub fn user_message(&self) -> String {
        match self {
            KosError::Validation(msg) => format!("❌ {msg}"),
            KosError::NotFound(msg) => format!("❌ {msg}"),
            KosError::Conflict(msg) => format!("❌ {msg}"),
            KosError::Auth => "❌ Authentication failed.".to_string(),
            KosError::RateLimited => "⏳ Rate limit exceeded. Try again shortly.".to_string(),
            KosError::Roblox(_) | KosError::Http(_) => {
                "❌ Could not reach the Roblox API. Try again later.".to_string()
            }
            _ => "❌ An internal error occurred. It has been logged.".to_string(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            KosError::Database(_) => false,
            KosError::Migration(_) => false,
            KosError::Config(_) => false,
            KosError::Serialization(_) => false,
            KosError::Telegram(_) => true,
            KosError::Roblox(_) => true,
            KosError::Http(_) => true,
            KosError::Io(_) => true,
            KosError::RateLimited => true,
            KosError::Validation(_) => false,
            KosError::NotFound(_) => false,
            KosError::Conflict(_) => false,
            KosError::Auth => false,
        }
    }
}
