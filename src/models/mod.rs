//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod report;
pub mod working_chat;

// Re-export commonly used models
pub use user::{User, Role};
pub use report::{Report, ReportHalf, ReportRef, Half, Approval};
pub use working_chat::WorkingChat;
