//! Inbound events
//!
//! Transport-neutral description of what a user did. The bot glue builds these
//! from Telegram updates; tests build them directly.

use chrono::NaiveDate;

use crate::models::{Half, ReportRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// Explicit keyword commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    AddExaminer,
    RemoveExaminer,
    AssignAdmin,
    AssignTeleAdmin,
    DemoteAdmin,
    BlockUser,
    UnblockUser,
    SetWorkingChat,
    EditName,
    EditPosition,
    ListUsers,
    /// Registers the group it is sent from as a working chat
    RegisterChat,
}

/// Inline button payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Approve(ReportRef),
    Reject(ReportRef),
    Comment(ReportRef),
    Answer { reviewer_id: i64, report: ReportRef },
    ConfirmReport,
    ForceSend,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Keyword(Keyword),
    Text(String),
    /// A user chosen through the user picker
    UserPicked(i64),
    /// A chat chosen through the chat picker
    ChatPicked(i64),
    Button(Button),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: i64,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub username: Option<String>,
    pub chat_title: Option<String>,
    /// Set for button presses, answered once dispatch finishes
    pub callback_id: Option<String>,
    /// Message carrying the pressed button
    pub message_id: Option<i32>,
    pub kind: EventKind,
}

impl InboundEvent {
    /// A private-chat event, the common case
    pub fn private(user_id: i64, kind: EventKind) -> Self {
        Self {
            user_id,
            chat_id: user_id,
            chat_kind: ChatKind::Private,
            username: None,
            chat_title: None,
            callback_id: None,
            message_id: None,
            kind,
        }
    }

    pub fn in_group(user_id: i64, chat_id: i64, kind: EventKind) -> Self {
        Self {
            chat_id,
            chat_kind: ChatKind::Group,
            ..Self::private(user_id, kind)
        }
    }

    pub fn is_private(&self) -> bool {
        self.chat_kind == ChatKind::Private
    }

    /// Short name of the event shape for logs
    pub fn shape(&self) -> &'static str {
        match self.kind {
            EventKind::Start => "start",
            EventKind::Keyword(_) => "keyword",
            EventKind::Text(_) => "text",
            EventKind::UserPicked(_) => "user_picked",
            EventKind::ChatPicked(_) => "chat_picked",
            EventKind::Button(_) => "button",
        }
    }
}

fn encode_ref(report: &ReportRef) -> String {
    format!("{}:{}:{}", report.author_id, report.date.format("%Y%m%d"), report.half.code())
}

fn decode_ref(parts: &[&str]) -> Option<ReportRef> {
    match parts {
        [author, date, half] => Some(ReportRef {
            author_id: author.parse().ok()?,
            date: NaiveDate::parse_from_str(date, "%Y%m%d").ok()?,
            half: Half::from_code(half)?,
        }),
        _ => None,
    }
}

impl Button {
    /// Callback payload, kept well under Telegram's 64 byte limit
    pub fn to_callback_data(&self) -> String {
        match self {
            Button::Approve(r) => format!("ap:{}", encode_ref(r)),
            Button::Reject(r) => format!("rj:{}", encode_ref(r)),
            Button::Comment(r) => format!("cm:{}", encode_ref(r)),
            Button::Answer { reviewer_id, report } => {
                format!("an:{}:{}", reviewer_id, encode_ref(report))
            }
            Button::ConfirmReport => "confirm".to_string(),
            Button::ForceSend => "force".to_string(),
            Button::Cancel => "cancel".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        match parts.as_slice() {
            ["confirm"] => Some(Button::ConfirmReport),
            ["force"] => Some(Button::ForceSend),
            ["cancel"] => Some(Button::Cancel),
            ["ap", rest @ ..] => decode_ref(rest).map(Button::Approve),
            ["rj", rest @ ..] => decode_ref(rest).map(Button::Reject),
            ["cm", rest @ ..] => decode_ref(rest).map(Button::Comment),
            ["an", reviewer, rest @ ..] => Some(Button::Answer {
                reviewer_id: reviewer.parse().ok()?,
                report: decode_ref(rest)?,
            }),
            _ => None,
        }
    }
}
