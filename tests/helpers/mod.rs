//! Test helpers module
//!
//! Fakes for the transport and the analyzer, a mock Telegram API server and a
//! test context wiring them into a dispatcher over the in-memory store.

#![allow(dead_code)]

pub mod fake_transport;
pub mod scripted_analyzer;
pub mod telegram_mock;
pub mod test_context;

pub use fake_transport::*;
pub use scripted_analyzer::*;
pub use telegram_mock::*;
pub use test_context::*;
