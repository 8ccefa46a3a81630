//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod report;
pub mod working_chat;

// Re-export repositories
pub use user::UserRepository;
pub use report::ReportRepository;
pub use working_chat::WorkingChatRepository;
