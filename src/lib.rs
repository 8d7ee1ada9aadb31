//! Brotherhood-KOS
//!
//! Kill-on-sight list management for Roblox moderation: a Telegram bot
//! surface for moderators, a bearer-token REST API, and a Postgres-backed
//! entry lifecycle with an append-only audit trail.

pub mod api;
pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use database::Database;
pub use services::ServiceFactory;
pub use state::BotState;
pub use utils::errors::{KosError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
