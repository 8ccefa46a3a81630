//! ReportBuddy Telegram Bot
//!
//! Collects twice-daily status reports from employees and routes them to
//! reviewers. Commands from one user never run concurrently; slow ones are
//! handed to a background worker pool.

#![allow(non_snake_case)]

pub mod bot;
pub mod commands;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ReportBuddyError, Result};

// Re-export main components for easy access
pub use commands::{resolve, Command, InboundEvent};
pub use database::{DatabaseService, MemoryStore, Store};
pub use dispatch::{DispatchOutcome, Dispatcher, UserLocks};
pub use state::{AppContext, State};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
