//! Telegram glue
//!
//! Turns teloxide updates into [`InboundEvent`]s and hands them to the
//! [`Dispatcher`]. Nothing here looks at user state.

use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::dptree;
use teloxide::types::{CallbackQuery, Message, MessageKind, Update};
use teloxide::utils::command::BotCommands;
use tracing::{debug, warn};

use crate::commands::{Button, ChatKind, EventKind, InboundEvent, Keyword};
use crate::dispatch::Dispatcher;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
type HandlerResult = Result<(), HandlerError>;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "ReportBuddy commands")]
pub enum BotCommand {
    #[command(description = "Register or show your status")]
    Start,
    #[command(description = "Make a user an examiner (admin only)")]
    AddExaminer,
    #[command(description = "Remove examiner rights (admin only)")]
    RemoveExaminer,
    #[command(description = "Make a user an admin (admin only)")]
    AssignAdmin,
    #[command(description = "Make a user a tele-admin (admin only)")]
    AssignTeleadmin,
    #[command(description = "Demote an admin to employee (admin only)")]
    DemoteAdmin,
    #[command(description = "Block a user (admin only)")]
    Block,
    #[command(description = "Unblock a user (admin only)")]
    Unblock,
    #[command(description = "Assign a user's working chat (admin only)")]
    SetWorkingChat,
    #[command(description = "Edit a user's full name (admin only)")]
    EditName,
    #[command(description = "Edit a user's position (admin only)")]
    EditPosition,
    #[command(description = "List registered users (admin only)")]
    ListUsers,
    #[command(description = "Register this group as a working chat (admin only)")]
    RegisterChat,
}

impl BotCommand {
    pub fn event_kind(&self) -> EventKind {
        let keyword = match self {
            BotCommand::Start => return EventKind::Start,
            BotCommand::AddExaminer => Keyword::AddExaminer,
            BotCommand::RemoveExaminer => Keyword::RemoveExaminer,
            BotCommand::AssignAdmin => Keyword::AssignAdmin,
            BotCommand::AssignTeleadmin => Keyword::AssignTeleAdmin,
            BotCommand::DemoteAdmin => Keyword::DemoteAdmin,
            BotCommand::Block => Keyword::BlockUser,
            BotCommand::Unblock => Keyword::UnblockUser,
            BotCommand::SetWorkingChat => Keyword::SetWorkingChat,
            BotCommand::EditName => Keyword::EditName,
            BotCommand::EditPosition => Keyword::EditPosition,
            BotCommand::ListUsers => Keyword::ListUsers,
            BotCommand::RegisterChat => Keyword::RegisterChat,
        };
        EventKind::Keyword(keyword)
    }
}

/// Update handler tree
pub fn schema() -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<BotCommand>().endpoint(handle_command))
                .branch(dptree::endpoint(handle_message)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

fn from_message(msg: &Message, kind: EventKind) -> Option<InboundEvent> {
    let from = msg.from.as_ref()?;
    Some(InboundEvent {
        user_id: from.id.0 as i64,
        chat_id: msg.chat.id.0,
        chat_kind: if msg.chat.is_private() { ChatKind::Private } else { ChatKind::Group },
        username: from.username.clone(),
        chat_title: msg.chat.title().map(str::to_string),
        callback_id: None,
        message_id: None,
        kind,
    })
}

/// Free text and picker results
fn message_event_kind(msg: &Message) -> Option<EventKind> {
    match &msg.kind {
        MessageKind::UsersShared(shared) => shared
            .users_shared
            .users
            .first()
            .map(|user| EventKind::UserPicked(user.user_id.0 as i64)),
        MessageKind::ChatShared(shared) => {
            Some(EventKind::ChatPicked(shared.chat_shared.chat_id.0))
        }
        _ => msg.text().map(|text| EventKind::Text(text.to_string())),
    }
}

async fn dispatch(dispatcher: &Dispatcher, event: InboundEvent) -> HandlerResult {
    // the dispatcher already logged the failure and told the user
    if let Err(e) = dispatcher.dispatch(event).await {
        debug!(error = %e, "Update finished with an error");
    }
    Ok(())
}

async fn handle_command(
    msg: Message,
    cmd: BotCommand,
    dispatcher: Arc<Dispatcher>,
) -> HandlerResult {
    match from_message(&msg, cmd.event_kind()) {
        Some(event) => dispatch(&dispatcher, event).await,
        None => Ok(()),
    }
}

async fn handle_message(msg: Message, dispatcher: Arc<Dispatcher>) -> HandlerResult {
    let Some(kind) = message_event_kind(&msg) else {
        return Ok(());
    };
    match from_message(&msg, kind) {
        Some(event) => dispatch(&dispatcher, event).await,
        None => Ok(()),
    }
}

async fn handle_callback(query: CallbackQuery, dispatcher: Arc<Dispatcher>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    let Some(button) = query.data.as_deref().and_then(Button::parse) else {
        warn!(user_id = user_id, data = ?query.data, "Unknown callback payload");
        dispatcher
            .context()
            .notifications
            .answer_callback(&query.id, None)
            .await;
        return Ok(());
    };

    let (chat_id, chat_kind, chat_title, message_id) = match &query.message {
        Some(message) => {
            let chat = message.chat();
            let kind = if chat.is_private() { ChatKind::Private } else { ChatKind::Group };
            (chat.id.0, kind, chat.title().map(str::to_string), Some(message.id().0))
        }
        None => (user_id, ChatKind::Private, None, None),
    };

    let event = InboundEvent {
        user_id,
        chat_id,
        chat_kind,
        username: query.from.username.clone(),
        chat_title,
        callback_id: Some(query.id.clone()),
        message_id,
        kind: EventKind::Button(button),
    };
    dispatch(&dispatcher, event).await
}
