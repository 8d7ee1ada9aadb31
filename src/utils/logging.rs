//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the Brotherhood-KOS application.

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// Returns the appender guard; the caller must keep it alive for the
/// lifetime of the process or file output is silently dropped.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "brotherhood-kos.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log admin authentication events
pub fn log_admin_auth(admin_id: &str, success: bool) {
    if success {
        info!(admin_id = admin_id, "Admin authentication succeeded");
    } else {
        warn!(admin_id = admin_id, "Admin authentication failed");
    }
}
