//! Database module
//!
//! This module handles the store interface and its Postgres and in-memory backends

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations};
pub use memory::MemoryStore;
pub use repositories::{UserRepository, ReportRepository, WorkingChatRepository};
pub use service::DatabaseService;
pub use store::{Entity, Mutation, Store};
