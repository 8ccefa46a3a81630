//! Notification service implementation
//!
//! Best-effort delivery on top of a [`Transport`]: failures are logged and
//! counted but never surface to the command that produced the message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::transport::{Keyboard, Transport};
use crate::utils::logging::log_delivery_failure;

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Outgoing {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), keyboard: None }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Notification statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_failed: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
}

#[derive(Clone)]
pub struct NotificationService {
    transport: Arc<dyn Transport>,
    counters: Arc<Counters>,
}

impl NotificationService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Send one message; returns whether it was delivered
    pub async fn send(&self, message: Outgoing) -> bool {
        let chat_id = message.chat_id;
        match self.transport.send_text(chat_id, &message.text, message.keyboard).await {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                log_delivery_failure(chat_id, &e.to_string());
                false
            }
        }
    }

    /// Send messages in order; one failure does not stop the rest
    pub async fn send_all(&self, messages: Vec<Outgoing>) -> usize {
        let total = messages.len();
        let mut delivered = 0;
        for message in messages {
            if self.send(message).await {
                delivered += 1;
            }
        }
        if total > 0 {
            debug!(total = total, delivered = delivered, "Notifications sent");
        }
        delivered
    }

    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(callback_id, text).await {
            debug!(callback_id = callback_id, error = %e, "Failed to answer callback query");
        }
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i32) {
        if let Err(e) = self.transport.delete_message(chat_id, message_id).await {
            debug!(
                chat_id = chat_id,
                message_id = message_id,
                error = %e,
                "Failed to delete message"
            );
        }
    }

    pub async fn typing(&self, chat_id: i64) {
        if let Err(e) = self.transport.send_typing(chat_id).await {
            debug!(chat_id = chat_id, error = %e, "Failed to send typing action");
        }
    }

    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            total_sent: self.counters.sent.load(Ordering::Relaxed),
            total_failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
