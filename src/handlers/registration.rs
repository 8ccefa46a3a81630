//! Registration handlers
//!
//! First contact creates the user; full name and position are collected before
//! the user lands in their role's settled state.

use chrono::Utc;
use tracing::info;

use crate::commands::InboundEvent;
use crate::database::Mutation;
use crate::handlers::{texts, Outbox};
use crate::models::{Role, User};
use crate::state::{AppContext, Pending, State};
use crate::utils::errors::Result;
use crate::utils::helpers::{is_valid_full_name, normalize_whitespace, truncate_text};

const MAX_POSITION_CHARS: usize = 100;

pub async fn bootstrap(ctx: &AppContext, event: &InboundEvent) -> Result<Outbox> {
    let role = if ctx.is_bootstrap_admin(event.user_id) {
        Role::Admin
    } else {
        Role::Employee
    };
    let user = User::new(event.user_id, event.chat_id, event.username.clone(), role, Utc::now());
    ctx.store.save(vec![Mutation::User(user)]).await?;

    info!(user_id = event.user_id, role = ?role, "New user started registration");
    Ok(Outbox::reply(event.chat_id, texts::ASK_FULL_NAME))
}

pub fn greet(user: &User) -> Outbox {
    Outbox::reply(user.chat_id, texts::greeting(user))
}

pub async fn submit_full_name(ctx: &AppContext, mut user: User, text: &str) -> Result<Outbox> {
    let full_name = normalize_whitespace(text);
    if !is_valid_full_name(&full_name) {
        return Ok(Outbox::reply(user.chat_id, texts::INVALID_FULL_NAME));
    }

    user.full_name = Some(full_name);
    user.transition(State::AwaitingPositionInput, Pending::None)?;
    ctx.store.save(vec![Mutation::User(user.clone())]).await?;

    Ok(Outbox::reply(user.chat_id, texts::ASK_POSITION))
}

pub async fn submit_position(ctx: &AppContext, mut user: User, text: &str) -> Result<Outbox> {
    let position = normalize_whitespace(text);
    if position.is_empty() {
        return Ok(Outbox::reply(user.chat_id, texts::INVALID_POSITION));
    }

    user.position = Some(truncate_text(&position, MAX_POSITION_CHARS));
    user.settle()?;
    ctx.store.save(vec![Mutation::User(user.clone())]).await?;

    info!(user_id = user.id, "User completed registration");
    Ok(Outbox::reply(user.chat_id, texts::registered(&user)))
}
