//! Services module
//!
//! External collaborators (transport, analyzer) and the report lifecycle

pub mod analyzer;
pub mod notification;
pub mod reports;
pub mod transport;

// Re-export commonly used services
pub use analyzer::{Analysis, Analyzer, DisabledAnalyzer, HttpAnalyzer};
pub use notification::{NotificationService, NotificationStats, Outgoing};
pub use reports::{ReportService, Submission};
pub use transport::{Keyboard, TelegramTransport, Transport};

use std::sync::Arc;

use tracing::info;

use crate::config::AnalyzerConfig;
use crate::utils::errors::Result;

/// Build the analyzer selected by configuration
pub fn analyzer_from_config(config: &AnalyzerConfig) -> Result<Arc<dyn Analyzer>> {
    if config.enabled {
        info!(url = %config.url, "Report analyzer enabled");
        Ok(Arc::new(HttpAnalyzer::new(config)?))
    } else {
        info!("Report analyzer disabled, reports go through the manual path");
        Ok(Arc::new(DisabledAnalyzer))
    }
}
