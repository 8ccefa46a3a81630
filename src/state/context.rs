//! Application context
//!
//! Everything a command handler needs, shared behind one `Arc` by the
//! dispatcher, the background workers and the bot glue.

use std::sync::Arc;

use crate::config::Settings;
use crate::database::Store;
use crate::policy::{Clock, WindowPolicy};
use crate::services::{Analyzer, NotificationService, ReportService, Transport};
use crate::utils::errors::Result;

/// Application-wide context containing services and settings
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub analyzer: Arc<dyn Analyzer>,
    pub notifications: NotificationService,
    pub reports: ReportService,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
        analyzer: Arc<dyn Analyzer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let policy = WindowPolicy::from_config(&settings.schedule)?;
        let reports = ReportService::new(store.clone(), clock.clone(), policy);

        Ok(Self {
            settings,
            store,
            clock,
            analyzer,
            notifications: NotificationService::new(transport),
            reports,
        })
    }

    pub fn policy(&self) -> &WindowPolicy {
        self.reports.policy()
    }

    pub fn is_bootstrap_admin(&self, user_id: i64) -> bool {
        self.settings.bot.admin_ids.contains(&user_id)
    }
}
