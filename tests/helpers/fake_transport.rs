//! Recording transport
//!
//! Keeps every outgoing message, callback answer and deletion so tests can
//! assert on what users would have seen. Sends can be made to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ReportBuddy::services::{Keyboard, Transport};
use ReportBuddy::utils::errors::{ReportBuddyError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<SentMessage>>,
    answered: Mutex<Vec<String>>,
    deleted: Mutex<Vec<(i64, i32)>>,
    fail_sends: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text)
            .collect()
    }

    /// Last text sent to `chat_id`
    pub fn last_to(&self, chat_id: i64) -> Option<String> {
        self.sent_to(chat_id).pop()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(i64, i32)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.answered.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ReportBuddyError::InvalidInput(format!("send to {} refused", chat_id)));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn send_typing(&self, _chat_id: i64) -> Result<()> {
        Ok(())
    }
}
