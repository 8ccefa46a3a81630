//! Review handlers
//!
//! Approve, comment on and reject report halves, and the author's answer to a
//! reviewer. Approvals and rejections hold both the reviewer's and the author's
//! sections.

use tracing::warn;

use crate::database::Mutation;
use crate::handlers::{texts, Outbox};
use crate::models::{Approval, ReportRef, User};
use crate::state::{AnswerPointer, AppContext, Pending, ReviewPointer, State};
use crate::utils::errors::{ReportBuddyError, Result};

fn missing_pointer(user: &User) -> ReportBuddyError {
    ReportBuddyError::InvalidStateTransition {
        from: user.state().to_string(),
        to: user.role.settled_state().to_string(),
    }
}

/// Load the other party of a review for a notification; the change is already
/// committed, so a failed lookup only costs the message
async fn notified_user(ctx: &AppContext, user_id: i64) -> Option<User> {
    match ctx.store.load_user(user_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Failed to load user to notify");
            None
        }
    }
}

pub async fn approve(ctx: &AppContext, reviewer: User, target: ReportRef) -> Result<Outbox> {
    let approval = match ctx.reports.approve(reviewer.id, target).await? {
        None => return Ok(Outbox::reply(reviewer.chat_id, texts::REPORT_GONE)),
        Some((_, approval)) => approval,
    };
    if approval == Approval::AlreadyApproved {
        return Ok(Outbox::reply(reviewer.chat_id, texts::ALREADY_APPROVED));
    }

    let mut outbox = Outbox::new();
    if let Some(author) = notified_user(ctx, target.author_id).await {
        outbox
            .send(reviewer.chat_id, texts::approved_for_reviewer(&author, target))
            .send(author.chat_id, texts::approved_for_author(target, &reviewer));
    }
    Ok(outbox)
}

/// Ask the reviewer for a comment; `reject` removes the half once it arrives
pub async fn start_comment(
    ctx: &AppContext,
    mut reviewer: User,
    target: ReportRef,
    reject: bool,
) -> Result<Outbox> {
    if ctx.reports.load_half(target).await?.is_none() {
        return Ok(Outbox::reply(reviewer.chat_id, texts::REPORT_GONE));
    }

    let (state, prompt) = if reject {
        (State::AwaitingRejectCommentInput, texts::ASK_REJECT_COMMENT)
    } else {
        (State::AwaitingCommentInput, texts::ASK_COMMENT)
    };
    reviewer.transition(state, Pending::Reviewing(ReviewPointer { report: target }))?;
    ctx.store.save(vec![Mutation::User(reviewer.clone())]).await?;

    let mut outbox = Outbox::new();
    outbox.send_with(reviewer.chat_id, prompt, texts::cancel_keyboard());
    Ok(outbox)
}

pub async fn submit_comment(ctx: &AppContext, mut reviewer: User, text: &str) -> Result<Outbox> {
    let target = reviewer
        .reviewing_report()
        .map(|p| p.report)
        .ok_or_else(|| missing_pointer(&reviewer))?;
    reviewer.settle()?;
    ctx.store.save(vec![Mutation::User(reviewer.clone())]).await?;

    let mut outbox = Outbox::reply(reviewer.chat_id, texts::COMMENT_SENT);
    if let Some(author) = notified_user(ctx, target.author_id).await {
        outbox.send_with(
            author.chat_id,
            texts::comment_for_author(target, &reviewer, text),
            texts::answer_keyboard(reviewer.id, target),
        );
    }
    Ok(outbox)
}

pub async fn submit_reject_comment(
    ctx: &AppContext,
    mut reviewer: User,
    text: &str,
) -> Result<Outbox> {
    let target = reviewer
        .reviewing_report()
        .map(|p| p.report)
        .ok_or_else(|| missing_pointer(&reviewer))?;

    if ctx.reports.reject(&mut reviewer, target).await?.is_none() {
        return Ok(Outbox::reply(reviewer.chat_id, texts::REPORT_GONE));
    }

    let mut outbox = Outbox::reply(reviewer.chat_id, texts::rejected_for_reviewer(target));
    if let Some(author) = notified_user(ctx, target.author_id).await {
        outbox.send_with(
            author.chat_id,
            texts::rejected_for_author(target, &reviewer, text),
            texts::answer_keyboard(reviewer.id, target),
        );
    }
    Ok(outbox)
}

pub async fn start_answer(
    ctx: &AppContext,
    mut author: User,
    reviewer_id: i64,
    report: ReportRef,
) -> Result<Outbox> {
    let pointer = AnswerPointer { reviewer_id, report };
    author.transition(State::AwaitingAnswerInput, Pending::Answering(pointer))?;
    ctx.store.save(vec![Mutation::User(author.clone())]).await?;

    let mut outbox = Outbox::new();
    outbox.send_with(author.chat_id, texts::ASK_ANSWER, texts::cancel_keyboard());
    Ok(outbox)
}

pub async fn submit_answer(ctx: &AppContext, mut author: User, text: &str) -> Result<Outbox> {
    let pointer = *author.answer_for().ok_or_else(|| missing_pointer(&author))?;
    author.settle()?;
    ctx.store.save(vec![Mutation::User(author.clone())]).await?;

    let mut outbox = Outbox::reply(author.chat_id, texts::ANSWER_SENT);
    if let Some(reviewer) = notified_user(ctx, pointer.reviewer_id).await {
        outbox.send_with(
            reviewer.chat_id,
            texts::answer_for_reviewer(pointer.report, &author, text),
            texts::comment_keyboard(pointer.report),
        );
    }
    Ok(outbox)
}
