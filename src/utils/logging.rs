//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the ReportBuddy application.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{ReportBuddyError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file appender and must be kept alive for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, "reportbuddy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(non_blocking).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking).boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| ReportBuddyError::Config(format!("Failed to install subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a dispatched command with structured data
pub fn log_command(user_id: i64, command: &str, background: bool) {
    debug!(
        user_id = user_id,
        command = command,
        background = background,
        "Command dispatched"
    );
}

/// Log a background command discarded because the user moved on
pub fn log_dropped_command(user_id: i64, command: &str, state: &str) {
    info!(
        user_id = user_id,
        command = command,
        state = state,
        "Background command no longer applies, dropped"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<i64>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log a best-effort delivery failure
pub fn log_delivery_failure(chat_id: i64, error: &str) {
    warn!(
        chat_id = chat_id,
        error = error,
        "Best-effort delivery failed"
    );
}
