//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod auth;
pub mod config;
pub mod entries;
pub mod history;
pub mod logs;

// Re-export repositories
pub use auth::AuthRepository;
pub use config::ConfigRepository;
pub use entries::EntryRepository;
pub use history::HistoryRepository;
pub use logs::LogRepository;
