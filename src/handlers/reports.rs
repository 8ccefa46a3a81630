//! Report submission handlers

use tracing::{info, warn};

use crate::commands::InboundEvent;
use crate::database::Mutation;
use crate::handlers::{texts, Note, Outbox};
use crate::models::{Half, Report, User};
use crate::policy::{SubmissionPath, SubmissionRejection};
use crate::services::{Analysis, Keyboard, Outgoing, Submission};
use crate::state::{AppContext, Pending, State};
use crate::utils::errors::{AnalyzerError, AnalyzerResult, ReportBuddyError, Result};

/// What can be done with a report text right now, decided outside the section
#[derive(Debug, Clone, PartialEq)]
pub enum DraftCheck {
    /// Nothing can be submitted now
    Refused(SubmissionRejection),
    /// Only a late, forced submission is possible now
    ManualOnly(SubmissionRejection),
    /// The analyzer's verdict, or why there is none
    Scored(AnalyzerResult<Analysis>),
}

pub async fn check_draft(ctx: &AppContext, event: &InboundEvent, text: &str) -> Result<DraftCheck> {
    match ctx.reports.preview(event.user_id, SubmissionPath::Analyzed).await? {
        Ok(_) => {
            if !ctx.analyzer.is_enabled() {
                return Ok(DraftCheck::Scored(Err(AnalyzerError::Disabled)));
            }
            ctx.notifications.typing(event.chat_id).await;
            Ok(DraftCheck::Scored(ctx.analyzer.score(text).await))
        }
        Err(rejection @ SubmissionRejection::AlreadySubmitted(_)) => {
            Ok(DraftCheck::Refused(rejection))
        }
        Err(rejection) => match ctx.reports.preview(event.user_id, SubmissionPath::Forced).await? {
            Ok(_) => Ok(DraftCheck::ManualOnly(rejection)),
            Err(_) => Ok(DraftCheck::Refused(rejection)),
        },
    }
}

/// Keep the text as a draft awaiting confirmation
pub async fn store_draft(
    ctx: &AppContext,
    mut user: User,
    text: String,
    check: DraftCheck,
) -> Result<Outbox> {
    let ((reply, keyboard), score) = match check {
        DraftCheck::Refused(rejection) => {
            return Ok(Outbox::reply(user.chat_id, texts::rejection(rejection)));
        }
        DraftCheck::ManualOnly(rejection) => (texts::manual_only(rejection), None),
        DraftCheck::Scored(Ok(analysis)) => {
            (texts::scored(&analysis, ctx.settings.analyzer.min_score), Some(analysis.score))
        }
        DraftCheck::Scored(Err(e)) => {
            if e != AnalyzerError::Disabled {
                warn!(
                    user_id = user.id,
                    error = %e,
                    "Report analysis failed, offering manual send"
                );
            }
            (texts::analyzer_unavailable(), None)
        }
    };

    user.transition(State::AwaitingReportConfirmation, Pending::Draft { text, score })?;
    ctx.store.save(vec![Mutation::User(user.clone())]).await?;

    let mut outbox = Outbox::new();
    outbox.send_with(user.chat_id, reply, keyboard);
    Ok(outbox)
}

/// Submit the draft, through the analyzed path or forced
pub async fn submit(
    ctx: &AppContext,
    mut user: User,
    event: &InboundEvent,
    forced: bool,
) -> Result<Outbox> {
    let (text, score) = match user.pending() {
        Pending::Draft { text, score } => (text.clone(), *score),
        _ => {
            return Err(ReportBuddyError::InvalidStateTransition {
                from: user.state().to_string(),
                to: State::AwaitingReportInput.to_string(),
            })
        }
    };

    if !forced && score.map_or(true, |s| s < ctx.settings.analyzer.min_score) {
        let (reply, keyboard) = texts::low_score_confirm();
        let mut outbox = Outbox::new();
        outbox.send_with(user.chat_id, reply, keyboard);
        return Ok(outbox);
    }

    let path = if forced { SubmissionPath::Forced } else { SubmissionPath::Analyzed };
    let mut outbox = Outbox::new();

    match ctx.reports.submit(&mut user, &text, path).await? {
        Submission::Created { report, plan } => {
            let half = report.half(plan.half).ok_or_else(|| {
                let half = plan.half.as_str();
                ReportBuddyError::InvalidInput(format!("{} half missing after submit", half))
            })?;
            outbox
                .delete(event.chat_id, event.message_id)
                .send(user.chat_id, texts::submitted(plan.half, half));
            outbox.messages.extend(review_messages(ctx, &user, &report, plan.half).await);

            if ctx.analyzer.is_enabled() {
                outbox.note(match plan.half {
                    Half::Morning => Note::Motivate { chat_id: user.chat_id, report: text },
                    Half::Evening => Note::Praise { chat_id: user.chat_id, report: text },
                });
            }
        }
        Submission::Rejected(rejection @ SubmissionRejection::AlreadySubmitted(_)) => {
            user.settle()?;
            ctx.store.save(vec![Mutation::User(user.clone())]).await?;
            outbox
                .delete(event.chat_id, event.message_id)
                .send(user.chat_id, texts::rejection(rejection));
        }
        Submission::Rejected(rejection) => {
            let forced_possible = !forced
                && ctx.reports.preview(user.id, SubmissionPath::Forced).await?.is_ok();
            let (reply, keyboard) = if forced_possible {
                texts::manual_only(rejection)
            } else {
                (texts::rejection(rejection), texts::cancel_keyboard())
            };
            outbox.send_with(user.chat_id, reply, keyboard);
        }
    }

    Ok(outbox)
}

/// Review requests for a freshly created half
///
/// Goes to the author's working chat and to every reviewer. Reviewer lookup is
/// best-effort like the delivery itself.
async fn review_messages(
    ctx: &AppContext,
    author: &User,
    report: &Report,
    half: Half,
) -> Vec<Outgoing> {
    let Some(report_half) = report.half(half) else {
        return Vec::new();
    };
    let reference = report.reference(half);
    let text = texts::review_notification(author, reference, report_half);
    let keyboard = texts::review_keyboard(reference, report_half.is_approved());

    let mut chats: Vec<i64> = author.working_chat_id.into_iter().collect();
    match ctx.reports.reviewers_of(author.id).await {
        Ok(reviewers) => chats.extend(reviewers.iter().map(|r| r.chat_id)),
        Err(e) => warn!(user_id = author.id, error = %e, "Failed to list reviewers"),
    }
    chats.sort_unstable();
    chats.dedup();

    info!(
        user_id = author.id,
        half = half.as_str(),
        recipients = chats.len(),
        "Sending review requests"
    );
    chats
        .into_iter()
        .map(|chat_id| Outgoing::text(chat_id, text.clone()).with_keyboard(keyboard.clone()))
        .collect()
}

/// Leave any cancellable flow and return to the settled state
pub async fn cancel(ctx: &AppContext, mut user: User, event: &InboundEvent) -> Result<Outbox> {
    user.settle()?;
    ctx.store.save(vec![Mutation::User(user.clone())]).await?;

    let mut outbox = Outbox::new();
    outbox
        .delete(event.chat_id, event.message_id)
        .send_with(user.chat_id, texts::CANCELLED, Keyboard::Remove);
    Ok(outbox)
}
