//! Error handling for ReportBuddy
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for ReportBuddy application
#[derive(Error, Debug)]
pub enum ReportBuddyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Report not found: user {user_id} on {date}")]
    ReportNotFound { user_id: i64, date: chrono::NaiveDate },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Background queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("Command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Users involved with {user_id}'s command kept changing")]
    SectionContention { user_id: i64 },
}

/// Report analyzer specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("Analyzer is disabled")]
    Disabled,

    #[error("Analyzer request failed: {0}")]
    RequestFailed(String),

    #[error("Analyzer timeout")]
    Timeout,

    #[error("Invalid analyzer response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for ReportBuddy operations
pub type Result<T> = std::result::Result<T, ReportBuddyError>;

/// Result type alias for analyzer operations
pub type AnalyzerResult<T> = std::result::Result<T, AnalyzerError>;

impl ReportBuddyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReportBuddyError::Database(_) => false,
            ReportBuddyError::Migration(_) => false,
            ReportBuddyError::Telegram(_) => true,
            ReportBuddyError::Analyzer(_) => true,
            ReportBuddyError::Config(_) => false,
            ReportBuddyError::PermissionDenied(_) => false,
            ReportBuddyError::UserNotFound { .. } => false,
            ReportBuddyError::ReportNotFound { .. } => false,
            ReportBuddyError::InvalidStateTransition { .. } => false,
            ReportBuddyError::Http(_) => true,
            ReportBuddyError::Serialization(_) => false,
            ReportBuddyError::Io(_) => true,
            ReportBuddyError::InvalidInput(_) => false,
            ReportBuddyError::QueueUnavailable(_) => true,
            ReportBuddyError::Timeout(_) => true,
            ReportBuddyError::SectionContention { .. } => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReportBuddyError::Database(_) => ErrorSeverity::Critical,
            ReportBuddyError::Migration(_) => ErrorSeverity::Critical,
            ReportBuddyError::Config(_) => ErrorSeverity::Critical,
            ReportBuddyError::InvalidStateTransition { .. } => ErrorSeverity::Critical,
            ReportBuddyError::PermissionDenied(_) => ErrorSeverity::Warning,
            ReportBuddyError::QueueUnavailable(_) => ErrorSeverity::Warning,
            ReportBuddyError::Timeout(_) => ErrorSeverity::Warning,
            ReportBuddyError::SectionContention { .. } => ErrorSeverity::Warning,
            ReportBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_errors_are_recoverable() {
        let err: ReportBuddyError = AnalyzerError::Timeout.into();
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_broken_state_is_critical() {
        let err = ReportBuddyError::InvalidStateTransition {
            from: "Idle".to_string(),
            to: "AwaitingCommentInput".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
