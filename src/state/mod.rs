//! State management module
//!
//! The per-user conversation state machine and the shared application context

pub mod context;
pub mod machine;

// Re-export commonly used state components
pub use context::AppContext;
pub use machine::{AnswerPointer, Pending, PendingKind, ReviewPointer, State};
