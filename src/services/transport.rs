//! Outbound transport
//!
//! Handlers talk to users through [`Transport`] only. [`TelegramTransport`]
//! is the production implementation on top of teloxide.

use async_trait::async_trait;
use teloxide::{
    payloads::{AnswerCallbackQuerySetters, SendMessageSetters},
    prelude::*,
    types::{
        ButtonRequest, ChatAction, ChatId, InlineKeyboardButton, InlineKeyboardMarkup,
        KeyboardButton, KeyboardButtonRequestChat, KeyboardButtonRequestUsers, KeyboardMarkup,
        KeyboardRemove, MessageId, RequestId,
    },
    Bot,
};
use tracing::debug;

use crate::commands::Button;
use crate::utils::errors::Result;

const PICK_USER_REQUEST: i32 = 1;
const PICK_CHAT_REQUEST: i32 = 2;

/// Keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Rows of labelled callback buttons
    Inline(Vec<Vec<(String, Button)>>),
    /// One-time reply keyboard asking the user to share a user
    PickUser(String),
    /// One-time reply keyboard asking the user to share a group
    PickChat(String),
    /// Remove a previously shown reply keyboard
    Remove,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    async fn send_typing(&self, chat_id: i64) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn inline_markup(rows: Vec<Vec<(String, Button)>>) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(rows.into_iter().map(|row| {
            row.into_iter()
                .map(|(label, button)| {
                    InlineKeyboardButton::callback(label, button.to_callback_data())
                })
                .collect::<Vec<_>>()
        }))
    }

    fn picker(label: String, request: ButtonRequest) -> KeyboardMarkup {
        KeyboardMarkup::new(vec![vec![KeyboardButton::new(label).request(request)]])
            .resize_keyboard()
            .one_time_keyboard()
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        match keyboard {
            None => request.await?,
            Some(Keyboard::Inline(rows)) => request.reply_markup(Self::inline_markup(rows)).await?,
            Some(Keyboard::PickUser(label)) => {
                let users = KeyboardButtonRequestUsers::new(RequestId(PICK_USER_REQUEST));
                request.reply_markup(Self::picker(label, ButtonRequest::RequestUsers(users))).await?
            }
            Some(Keyboard::PickChat(label)) => {
                let chat = KeyboardButtonRequestChat::new(RequestId(PICK_CHAT_REQUEST), false);
                request.reply_markup(Self::picker(label, ButtonRequest::RequestChat(chat))).await?
            }
            Some(Keyboard::Remove) => request.reply_markup(KeyboardRemove::new()).await?,
        };
        debug!(chat_id = chat_id, "Message sent");
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let request = self.bot.answer_callback_query(callback_id.to_string());
        match text {
            Some(text) => request.text(text).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot.delete_message(ChatId(chat_id), MessageId(message_id)).await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot.send_chat_action(ChatId(chat_id), ChatAction::Typing).await?;
        Ok(())
    }
}
