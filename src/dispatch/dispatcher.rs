//! Command dispatcher
//!
//! Every inbound event is resolved inside the acting user's section. Inline
//! commands run there and then, widening the section to every user they touch;
//! background commands are queued and enter their sections again on a worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::commands::{resolve, Command, Execution, InboundEvent};
use crate::dispatch::locks::{SectionGuard, UserLocks};
use crate::dispatch::queue::{BackgroundJob, BackgroundQueue};
use crate::handlers::{self, texts, Outbox, Prepared};
use crate::models::User;
use crate::services::Outgoing;
use crate::state::{AppContext, State};
use crate::utils::errors::{ReportBuddyError, Result};
use crate::utils::logging::{log_command, log_dropped_command};

/// Attempts at entering a section that covers every user a command touches
const MAX_SECTION_ATTEMPTS: usize = 3;

/// What became of a dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command applies to the event in the user's current state
    Ignored,
    Executed(&'static str),
    Queued { job_id: Uuid, command: &'static str },
}

pub struct Dispatcher {
    ctx: Arc<AppContext>,
    locks: UserLocks,
    queue: BackgroundQueue,
    inline_timeout: Duration,
}

impl Dispatcher {
    pub fn new(ctx: Arc<AppContext>, locks: UserLocks, queue: BackgroundQueue) -> Self {
        let inline_timeout =
            Duration::from_secs(ctx.settings.dispatch.inline_timeout_seconds.max(1));
        Self {
            ctx,
            locks,
            queue,
            inline_timeout,
        }
    }

    pub fn with_inline_timeout(mut self, inline_timeout: Duration) -> Self {
        self.inline_timeout = inline_timeout;
        self
    }

    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Resolve and run or queue one inbound event
    ///
    /// The inline part is bounded by the configured timeout; on expiry the
    /// body is dropped together with any section it held. Failures are
    /// reported to the user before being returned.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<DispatchOutcome> {
        if let Some(callback_id) = &event.callback_id {
            self.ctx.notifications.answer_callback(callback_id, None).await;
        }

        let inline = tokio::time::timeout(self.inline_timeout, self.dispatch_inline(&event));
        let result = match inline.await {
            Ok(result) => result,
            Err(_) => Err(ReportBuddyError::Timeout(self.inline_timeout)),
        };

        match result {
            Ok((outcome, outbox)) => {
                handlers::deliver(&self.ctx, outbox).await;
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    user_id = event.user_id,
                    event = event.shape(),
                    severity = %e.severity(),
                    error = %e,
                    "Failed to dispatch event"
                );
                self.apologize(&event, &e).await;
                Err(e)
            }
        }
    }

    async fn dispatch_inline(&self, event: &InboundEvent) -> Result<(DispatchOutcome, Outbox)> {
        let mut user_ids = vec![event.user_id];

        for _ in 0..MAX_SECTION_ATTEMPTS {
            let section = self.locks.enter_many(&user_ids).await;
            let user = self.ctx.store.load_user(event.user_id).await?;

            let Some(command) = resolve(user.as_ref(), event) else {
                debug!(
                    user_id = event.user_id,
                    event = event.shape(),
                    "No command for event, ignoring"
                );
                return Ok((DispatchOutcome::Ignored, Outbox::new()));
            };

            if command.execution() == Execution::Background {
                return self
                    .enqueue(event, command, user.as_ref())
                    .map(|outcome| (outcome, Outbox::new()));
            }

            let needed = command.affected_users(event.user_id, user.as_ref());
            if !section.covers(&needed) {
                debug!(user_id = event.user_id, users = ?needed, "Widening section");
                drop(section);
                user_ids = needed;
                continue;
            }

            log_command(event.user_id, command.name(), false);
            let name = command.name();
            let outbox =
                handlers::execute(&self.ctx, user, event, command, Prepared::Nothing).await?;
            drop(section);
            return Ok((DispatchOutcome::Executed(name), outbox));
        }

        Err(ReportBuddyError::SectionContention { user_id: event.user_id })
    }

    fn enqueue(
        &self,
        event: &InboundEvent,
        command: Command,
        user: Option<&User>,
    ) -> Result<DispatchOutcome> {
        log_command(event.user_id, command.name(), true);
        let job = BackgroundJob::new(event.clone(), command, user.map(User::state));
        let outcome = DispatchOutcome::Queued {
            job_id: job.id,
            command: job.command.name(),
        };
        self.queue.enqueue(job)?;
        Ok(outcome)
    }

    /// Background queue drain entrypoint
    ///
    /// Slow preparation runs outside any section. The body then enters the
    /// sections itself and is dropped when the user has moved on since the
    /// command was resolved.
    pub async fn run_background_command(&self, job: BackgroundJob) -> Result<()> {
        let started = Instant::now();
        let job_id = job.id;
        let user_id = job.event.user_id;
        let command = job.command.name();
        let chat_id = job.event.chat_id;

        let result = self.run_job(job).await;
        match &result {
            Ok(()) => info!(
                job_id = %job_id,
                user_id = user_id,
                command = command,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Background command finished"
            ),
            Err(e) => {
                self.ctx
                    .notifications
                    .send(Outgoing::text(chat_id, texts::SOMETHING_WENT_WRONG))
                    .await;
                warn!(
                    job_id = %job_id,
                    user_id = user_id,
                    command = command,
                    error = %e,
                    "Background command failed"
                );
            }
        }
        result
    }

    async fn run_job(&self, job: BackgroundJob) -> Result<()> {
        let BackgroundJob {
            event,
            command,
            expected_state,
            ..
        } = job;

        // cheap look before the slow part; the decisive check is under the section
        let current = self.ctx.store.load_user(event.user_id).await?;
        if !still_applies(current.as_ref(), expected_state) {
            return self.drop_superseded(&event, &command, current.as_ref()).await;
        }

        let prepared = handlers::prepare(&self.ctx, &event, &command).await?;

        if !command.needs_section() {
            let outbox = handlers::execute(&self.ctx, current, &event, command, prepared).await?;
            handlers::deliver(&self.ctx, outbox).await;
            return Ok(());
        }

        let Some((section, user)) = self.enter_for(&event, &command, expected_state).await? else {
            return Ok(());
        };
        let outbox = handlers::execute(&self.ctx, Some(user), &event, command, prepared).await?;
        drop(section);

        handlers::deliver(&self.ctx, outbox).await;
        Ok(())
    }

    /// Enter the sections of every user `command` touches, checking the actor
    /// is still where the command was resolved
    async fn enter_for(
        &self,
        event: &InboundEvent,
        command: &Command,
        expected_state: Option<State>,
    ) -> Result<Option<(SectionGuard, User)>> {
        let mut user_ids = vec![event.user_id];

        for _ in 0..MAX_SECTION_ATTEMPTS {
            let section = self.locks.enter_many(&user_ids).await;
            let user = self.ctx.store.load_user(event.user_id).await?;

            let user = match user {
                Some(user) if still_applies(Some(&user), expected_state) => user,
                other => {
                    drop(section);
                    self.drop_superseded(event, command, other.as_ref()).await?;
                    return Ok(None);
                }
            };

            let needed = command.affected_users(event.user_id, Some(&user));
            if section.covers(&needed) {
                return Ok(Some((section, user)));
            }
            drop(section);
            user_ids = needed;
        }

        Err(ReportBuddyError::SectionContention { user_id: event.user_id })
    }

    async fn drop_superseded(
        &self,
        event: &InboundEvent,
        command: &Command,
        user: Option<&User>,
    ) -> Result<()> {
        let state = user.map_or("unknown", |u| u.state().as_str());
        log_dropped_command(event.user_id, command.name(), state);
        if user.is_some_and(|u| !u.is_blocked()) {
            handlers::deliver(&self.ctx, handlers::superseded(command, event)).await;
        }
        Ok(())
    }

    async fn apologize(&self, event: &InboundEvent, error: &ReportBuddyError) {
        let text = match error {
            ReportBuddyError::QueueUnavailable(_) => texts::BUSY,
            _ => texts::SOMETHING_WENT_WRONG,
        };
        self.ctx.notifications.send(Outgoing::text(event.chat_id, text)).await;
    }
}

/// A background command applies only while its actor stays where it was resolved
fn still_applies(user: Option<&User>, expected_state: Option<State>) -> bool {
    match user {
        Some(user) => !user.is_blocked() && Some(user.state()) == expected_state,
        None => false,
    }
}
