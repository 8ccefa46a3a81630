//! Commands module
//!
//! Inbound events, the commands they resolve to, and the resolver between them

pub mod command;
pub mod event;
pub mod resolver;

pub use command::{AdminFlow, Command, Execution};
pub use event::{Button, ChatKind, EventKind, InboundEvent, Keyword};
pub use resolver::resolve;
