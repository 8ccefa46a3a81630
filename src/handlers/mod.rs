//! Command handlers
//!
//! Handlers run inside the sections of every user they may change and return
//! an [`Outbox`]. The dispatcher delivers the outbox after the sections are
//! released, so transport latency never holds a user's section and a failed
//! delivery never undoes a committed change.

pub mod admin;
pub mod registration;
pub mod reports;
pub mod review;
pub mod texts;

use tracing::debug;

use crate::commands::{Command, InboundEvent};
use crate::models::User;
use crate::services::{Keyboard, Outgoing};
use crate::state::AppContext;
use crate::utils::errors::{ReportBuddyError, Result};

pub use reports::DraftCheck;

/// Analyzer-written follow-up sent after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// Motivation for the day ahead, based on the morning plan
    Motivate { chat_id: i64, report: String },
    /// Praise for the day's results
    Praise { chat_id: i64, report: String },
}

/// Everything a command wants to tell the outside world
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outbox {
    pub messages: Vec<Outgoing>,
    pub deletions: Vec<(i64, i32)>,
    pub notes: Vec<Note>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(chat_id: i64, text: impl Into<String>) -> Self {
        let mut outbox = Self::new();
        outbox.send(chat_id, text);
        outbox
    }

    pub fn send(&mut self, chat_id: i64, text: impl Into<String>) -> &mut Self {
        self.messages.push(Outgoing::text(chat_id, text));
        self
    }

    pub fn send_with(
        &mut self,
        chat_id: i64,
        text: impl Into<String>,
        keyboard: Keyboard,
    ) -> &mut Self {
        self.messages.push(Outgoing::text(chat_id, text).with_keyboard(keyboard));
        self
    }

    pub fn delete(&mut self, chat_id: i64, message_id: Option<i32>) -> &mut Self {
        if let Some(message_id) = message_id {
            self.deletions.push((chat_id, message_id));
        }
        self
    }

    pub fn note(&mut self, note: Note) -> &mut Self {
        self.notes.push(note);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.deletions.is_empty() && self.notes.is_empty()
    }
}

/// Work done for a background command before its section is entered
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    Nothing,
    Draft(DraftCheck),
}

/// Slow, section-free preparation of a background command
pub async fn prepare(
    ctx: &AppContext,
    event: &InboundEvent,
    command: &Command,
) -> Result<Prepared> {
    match command {
        Command::AnalyzeReport(text) => {
            Ok(Prepared::Draft(reports::check_draft(ctx, event, text).await?))
        }
        _ => Ok(Prepared::Nothing),
    }
}

fn require(actor: Option<User>, event: &InboundEvent) -> Result<User> {
    actor.ok_or(ReportBuddyError::UserNotFound { user_id: event.user_id })
}

/// Run a resolved command; the caller holds every section it needs
pub async fn execute(
    ctx: &AppContext,
    actor: Option<User>,
    event: &InboundEvent,
    command: Command,
    prepared: Prepared,
) -> Result<Outbox> {
    debug!(user_id = event.user_id, command = command.name(), "Executing command");

    if let Command::Bootstrap = command {
        return match actor {
            None => registration::bootstrap(ctx, event).await,
            Some(user) => Ok(registration::greet(&user)),
        };
    }

    let user = require(actor, event)?;
    match command {
        Command::Bootstrap => Ok(registration::greet(&user)),
        Command::Greet => Ok(registration::greet(&user)),
        Command::SubmitFullName(text) => registration::submit_full_name(ctx, user, &text).await,
        Command::SubmitPosition(text) => registration::submit_position(ctx, user, &text).await,
        Command::AnalyzeReport(text) => {
            let check = match prepared {
                Prepared::Draft(check) => check,
                Prepared::Nothing => reports::check_draft(ctx, event, &text).await?,
            };
            reports::store_draft(ctx, user, text, check).await
        }
        Command::ConfirmReport => reports::submit(ctx, user, event, false).await,
        Command::ForceSendReport => reports::submit(ctx, user, event, true).await,
        Command::Cancel => reports::cancel(ctx, user, event).await,
        Command::Approve(report) => review::approve(ctx, user, report).await,
        Command::StartComment(report) => review::start_comment(ctx, user, report, false).await,
        Command::StartReject(report) => review::start_comment(ctx, user, report, true).await,
        Command::SubmitComment(text) => review::submit_comment(ctx, user, &text).await,
        Command::SubmitRejectComment(text) => review::submit_reject_comment(ctx, user, &text).await,
        Command::StartAnswer { reviewer_id, report } => {
            review::start_answer(ctx, user, reviewer_id, report).await
        }
        Command::SubmitAnswer(text) => review::submit_answer(ctx, user, &text).await,
        Command::BeginAdminFlow(flow) => admin::begin_flow(ctx, user, flow).await,
        Command::ApplyAdminAction { flow, target } => {
            admin::apply_action(ctx, user, flow, target).await
        }
        Command::SelectEditTarget { flow, target } => {
            admin::select_edit_target(ctx, user, flow, target).await
        }
        Command::SubmitEditedText(text) => admin::submit_edited_text(ctx, user, &text).await,
        Command::PickWorkingChat(chat_id) => admin::pick_working_chat(ctx, user, chat_id).await,
        Command::ListUsers => admin::list_users(ctx, &user).await,
        Command::RegisterWorkingChat => admin::register_working_chat(ctx, &user, event).await,
    }
}

/// Reply for a background command the user has already moved past
pub fn superseded(command: &Command, event: &InboundEvent) -> Outbox {
    match command {
        Command::AnalyzeReport(_) | Command::ConfirmReport | Command::ForceSendReport => {
            Outbox::reply(event.chat_id, texts::ALREADY_HANDLED)
        }
        _ => Outbox::new(),
    }
}

/// Deliver an outbox; every step is best-effort
pub async fn deliver(ctx: &AppContext, outbox: Outbox) {
    if outbox.is_empty() {
        return;
    }

    for (chat_id, message_id) in outbox.deletions {
        ctx.notifications.delete_message(chat_id, message_id).await;
    }
    ctx.notifications.send_all(outbox.messages).await;

    for note in outbox.notes {
        let (chat_id, written) = match &note {
            Note::Motivate { chat_id, report } => (*chat_id, ctx.analyzer.motivate(report).await),
            Note::Praise { chat_id, report } => (*chat_id, ctx.analyzer.praise(report).await),
        };
        match written {
            Ok(text) if !text.trim().is_empty() => {
                ctx.notifications.send(Outgoing::text(chat_id, text)).await;
            }
            Ok(_) => {}
            Err(e) => debug!(chat_id = chat_id, error = %e, "Skipping analyzer note"),
        }
    }
}
