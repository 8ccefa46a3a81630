//! Administrative handlers
//!
//! Multi-step flows that pick a user (or a chat, then a user) and change the
//! picked user's record. Applying a flow holds both the admin's and the
//! target's sections.

use chrono::Utc;

use crate::commands::{AdminFlow, InboundEvent};
use crate::database::Mutation;
use crate::handlers::{texts, Outbox};
use crate::models::{Role, User, WorkingChat};
use crate::services::Keyboard;
use crate::state::{AppContext, Pending, State};
use crate::utils::errors::{ReportBuddyError, Result};
use crate::utils::helpers::{is_valid_full_name, normalize_whitespace, truncate_text};
use crate::utils::logging::log_admin_action;

const MAX_MESSAGE_CHARS: usize = 4000;
const MAX_POSITION_CHARS: usize = 100;

pub async fn begin_flow(ctx: &AppContext, mut admin: User, flow: AdminFlow) -> Result<Outbox> {
    admin.transition(flow.first_state(), Pending::None)?;
    ctx.store.save(vec![Mutation::User(admin.clone())]).await?;

    let (prompt, picker) = texts::flow_prompt(flow);
    let mut outbox = Outbox::new();
    outbox
        .send_with(admin.chat_id, prompt, picker)
        .send_with(admin.chat_id, texts::CANCEL_HINT, texts::cancel_keyboard());
    Ok(outbox)
}

/// Change `flow`'s target; `false` when the action does not apply to them
fn apply_to_target(flow: AdminFlow, target: &mut User, chat_id: Option<i64>) -> Result<bool> {
    if target.is_blocked() && flow != AdminFlow::UnblockUser && flow != AdminFlow::BlockUser {
        return Ok(false);
    }

    match flow {
        AdminFlow::AddExaminer => target.is_examiner = true,
        AdminFlow::RemoveExaminer => target.is_examiner = false,
        AdminFlow::AssignAdmin => target.set_role(Role::Admin)?,
        AdminFlow::AssignTeleAdmin => target.set_role(Role::TeleAdmin)?,
        AdminFlow::DemoteAdmin => {
            if !target.role.is_admin() {
                return Ok(false);
            }
            target.set_role(Role::Employee)?;
        }
        AdminFlow::BlockUser => target.block(),
        AdminFlow::UnblockUser => {
            if !target.is_blocked() {
                return Ok(false);
            }
            target.unblock();
        }
        AdminFlow::SetWorkingChat => {
            let chat_id = chat_id.ok_or_else(|| ReportBuddyError::InvalidStateTransition {
                from: State::AwaitingUserIdForWorkingChat.to_string(),
                to: "working chat assignment without a chat".to_string(),
            })?;
            target.working_chat_id = Some(chat_id);
        }
        AdminFlow::EditName | AdminFlow::EditPosition => {
            return Err(ReportBuddyError::InvalidInput(format!(
                "{} is applied with the new text",
                flow.as_str()
            )));
        }
    }
    // a flow opened under the old rights cannot be completed any more
    if target.state().is_cancellable() && !target.may_continue_flow() {
        target.settle()?;
    }
    target.updated_at = Utc::now();
    Ok(true)
}

pub async fn apply_action(
    ctx: &AppContext,
    mut admin: User,
    flow: AdminFlow,
    target_id: i64,
) -> Result<Outbox> {
    let self_targeted = target_id == admin.id
        && matches!(flow, AdminFlow::BlockUser | AdminFlow::DemoteAdmin | AdminFlow::UnblockUser);
    if self_targeted {
        return Ok(Outbox::reply(admin.chat_id, texts::CANNOT_TARGET_SELF));
    }

    let Some(mut target) = ctx.store.load_user(target_id).await? else {
        return Ok(Outbox::reply(admin.chat_id, texts::UNKNOWN_USER));
    };

    let working_chat = admin.selected_working_chat_id();
    admin.settle()?;

    if !apply_to_target(flow, &mut target, working_chat)? {
        ctx.store.save(vec![Mutation::User(admin.clone())]).await?;
        let mut outbox = Outbox::new();
        outbox.send_with(admin.chat_id, texts::not_applicable(flow, &target), Keyboard::Remove);
        return Ok(outbox);
    }

    ctx.store
        .save(vec![Mutation::User(admin.clone()), Mutation::User(target.clone())])
        .await?;
    log_admin_action(admin.id, flow.as_str(), Some(target.id), None);

    let mut outbox = Outbox::new();
    outbox.send_with(admin.chat_id, texts::admin_done(flow, &target), Keyboard::Remove);
    if let Some(notice) = texts::admin_notice(flow) {
        outbox.send(target.chat_id, notice);
    }
    Ok(outbox)
}

/// Remember whose name or position is being edited and ask for the text
pub async fn select_edit_target(
    ctx: &AppContext,
    mut admin: User,
    flow: AdminFlow,
    target_id: i64,
) -> Result<Outbox> {
    let Some(target) = ctx.store.load_user(target_id).await? else {
        return Ok(Outbox::reply(admin.chat_id, texts::UNKNOWN_USER));
    };

    let next = match flow {
        AdminFlow::EditPosition => State::AwaitingPositionForEdit,
        _ => State::AwaitingNameForEdit,
    };
    admin.transition(next, Pending::SelectedUser { user_id: target.id })?;
    ctx.store.save(vec![Mutation::User(admin.clone())]).await?;

    let mut outbox = Outbox::new();
    outbox.send_with(admin.chat_id, texts::ask_edited_text(flow, &target), Keyboard::Remove);
    Ok(outbox)
}

pub async fn submit_edited_text(ctx: &AppContext, mut admin: User, text: &str) -> Result<Outbox> {
    let flow = match admin.state() {
        State::AwaitingPositionForEdit => AdminFlow::EditPosition,
        _ => AdminFlow::EditName,
    };
    let target_id =
        admin.selected_user_id().ok_or_else(|| ReportBuddyError::InvalidStateTransition {
            from: admin.state().to_string(),
            to: admin.role.settled_state().to_string(),
        })?;

    let Some(mut target) = ctx.store.load_user(target_id).await? else {
        admin.settle()?;
        ctx.store.save(vec![Mutation::User(admin.clone())]).await?;
        return Ok(Outbox::reply(admin.chat_id, texts::UNKNOWN_USER));
    };

    let value = normalize_whitespace(text);
    match flow {
        AdminFlow::EditPosition => {
            if value.is_empty() {
                return Ok(Outbox::reply(admin.chat_id, texts::INVALID_POSITION));
            }
            target.position = Some(truncate_text(&value, MAX_POSITION_CHARS));
        }
        _ => {
            if !is_valid_full_name(&value) {
                return Ok(Outbox::reply(admin.chat_id, texts::INVALID_FULL_NAME));
            }
            target.full_name = Some(value);
        }
    }
    target.updated_at = Utc::now();
    admin.settle()?;

    ctx.store
        .save(vec![Mutation::User(admin.clone()), Mutation::User(target.clone())])
        .await?;
    log_admin_action(admin.id, flow.as_str(), Some(target.id), None);

    Ok(Outbox::reply(admin.chat_id, texts::admin_done(flow, &target)))
}

pub async fn pick_working_chat(ctx: &AppContext, mut admin: User, chat_id: i64) -> Result<Outbox> {
    let Some(chat) = ctx.store.load_working_chat(chat_id).await? else {
        return Ok(Outbox::reply(admin.chat_id, texts::CHAT_NOT_REGISTERED));
    };

    admin.transition(
        State::AwaitingUserIdForWorkingChat,
        Pending::SelectedWorkingChat { chat_id },
    )?;
    ctx.store.save(vec![Mutation::User(admin.clone())]).await?;

    let (prompt, picker) = texts::pick_user_for_chat(chat.title.as_deref());
    let mut outbox = Outbox::new();
    outbox.send_with(admin.chat_id, prompt, picker);
    Ok(outbox)
}

/// Read-only listing, split to fit Telegram's message limit
pub async fn list_users(ctx: &AppContext, admin: &User) -> Result<Outbox> {
    let users = ctx.store.list_users().await?;
    if users.is_empty() {
        return Ok(Outbox::reply(admin.chat_id, texts::NO_USERS));
    }

    let mut outbox = Outbox::new();
    let mut chunk = String::new();
    for user in &users {
        let line = texts::user_line(user);
        let grown = chunk.chars().count() + line.chars().count() + 1;
        if !chunk.is_empty() && grown > MAX_MESSAGE_CHARS {
            outbox.send(admin.chat_id, std::mem::take(&mut chunk));
        }
        if !chunk.is_empty() {
            chunk.push('\n');
        }
        chunk.push_str(&line);
    }
    outbox.send(admin.chat_id, chunk);
    Ok(outbox)
}

/// Register the group the command was sent from as a working chat
pub async fn register_working_chat(
    ctx: &AppContext,
    admin: &User,
    event: &InboundEvent,
) -> Result<Outbox> {
    let chat = WorkingChat {
        chat_id: event.chat_id,
        title: event.chat_title.clone(),
        registered_by: admin.id,
        created_at: Utc::now(),
    };
    ctx.store.save(vec![Mutation::WorkingChat(chat)]).await?;
    log_admin_action(admin.id, "register_working_chat", None, Some(&event.chat_id.to_string()));

    Ok(Outbox::reply(event.chat_id, texts::working_chat_registered(event.chat_title.as_deref())))
}
