//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::policy::WindowPolicy;
use crate::utils::errors::{ReportBuddyError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_schedule_config(&settings.schedule)?;
    validate_analyzer_config(&settings.analyzer)?;
    validate_dispatch_config(&settings.dispatch)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(ReportBuddyError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.admin_ids.is_empty() {
        return Err(ReportBuddyError::Config(
            "At least one admin ID must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(ReportBuddyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(ReportBuddyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(ReportBuddyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ReportBuddyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(ReportBuddyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

/// Validate the submission schedule by building the window policy from it
fn validate_schedule_config(config: &super::ScheduleConfig) -> Result<()> {
    WindowPolicy::from_config(config).map(|_| ())
}

/// Validate analyzer configuration
fn validate_analyzer_config(config: &super::AnalyzerConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.url.is_empty() {
        return Err(ReportBuddyError::Config(
            "Analyzer URL is required when the analyzer is enabled".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(ReportBuddyError::Config(
            "Analyzer timeout must be greater than 0".to_string()
        ));
    }

    if config.min_score > 10 {
        return Err(ReportBuddyError::Config(
            "Analyzer min_score must be between 0 and 10".to_string()
        ));
    }

    Ok(())
}

/// Validate dispatch configuration
fn validate_dispatch_config(config: &super::DispatchConfig) -> Result<()> {
    if config.inline_timeout_seconds == 0 {
        return Err(ReportBuddyError::Config(
            "Inline timeout must be greater than 0".to_string()
        ));
    }

    if config.queue_capacity == 0 || config.workers == 0 {
        return Err(ReportBuddyError::Config(
            "Background queue needs a positive capacity and at least one worker".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "12345:token".to_string();
        settings.bot.admin_ids = vec![1];
        settings
    }

    #[test]
    fn test_default_settings_with_token_are_valid() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token.clear();
        assert!(matches!(validate_settings(&settings), Err(ReportBuddyError::Config(_))));
    }

    #[test]
    fn test_overlapping_windows_rejected() {
        let mut settings = valid_settings();
        settings.schedule.evening = WindowConfig {
            start: "09:30".to_string(),
            end: "12:00".to_string(),
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut settings = valid_settings();
        settings.schedule.timezone = "Mars/Olympus".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut settings = valid_settings();
        settings.dispatch.workers = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
