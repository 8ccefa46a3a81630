//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::policy::EveningGate;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub analyzer: AnalyzerConfig,
    pub dispatch: DispatchConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Telegram ids promoted to `Admin` on first contact
    pub admin_ids: Vec<i64>,
}

/// Database configuration
///
/// `url = "memory://"` selects the in-process store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub json: bool,
}

/// A single submission window, wall-clock `"HH:MM"` in the schedule timezone
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

/// Report submission schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub morning: WindowConfig,
    pub evening: WindowConfig,
    pub evening_gate: EveningGate,
}

/// Report analyzer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    pub enabled: bool,
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    /// Scores below this are returned to the author with recommendations
    pub min_score: u8,
}

/// Command dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Upper bound for an inline command body, mirrors the transport request timeout
    pub inline_timeout_seconds: u64,
    pub queue_capacity: usize,
    pub workers: usize,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let file = std::env::var("REPORTBUDDY_CONFIG").unwrap_or_else(|_| "config".to_string());
        Self::load(&file)
    }

    /// Load settings from `file` (extension optional, missing file allowed)
    /// layered over the defaults, then environment variables
    pub fn load(file: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("REPORTBUDDY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ReportBuddyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/reportbuddy".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                json: false,
            },
            schedule: ScheduleConfig {
                timezone: "Europe/Moscow".to_string(),
                morning: WindowConfig {
                    start: "08:00".to_string(),
                    end: "10:00".to_string(),
                },
                evening: WindowConfig {
                    start: "17:00".to_string(),
                    end: "20:00".to_string(),
                },
                evening_gate: EveningGate::RequireMorning,
            },
            analyzer: AnalyzerConfig {
                enabled: false,
                url: "http://localhost:8081".to_string(),
                api_key: None,
                timeout_seconds: 20,
                min_score: 6,
            },
            dispatch: DispatchConfig {
                inline_timeout_seconds: 30,
                queue_capacity: 256,
                workers: 4,
            },
        }
    }
}
