//! Report lifecycle service
//!
//! Submission, approval and rejection of report halves. Every operation that
//! changes a user and a report together persists both in one save. Callers hold
//! the sections of every user involved.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::database::{Entity, Mutation, Store};
use crate::models::{Approval, Report, ReportHalf, ReportRef, User};
use crate::policy::{Clock, SubmissionPath, SubmissionPlan, SubmissionRejection, WindowPolicy};
use crate::utils::errors::Result;

/// Outcome of a submission attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Created { report: Report, plan: SubmissionPlan },
    Rejected(SubmissionRejection),
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    policy: WindowPolicy,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, policy: WindowPolicy) -> Self {
        Self { store, clock, policy }
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    pub fn today(&self) -> NaiveDate {
        self.policy.business_date(&self.clock.now())
    }

    /// What a submission would do right now, without writing anything
    pub async fn preview(
        &self,
        user_id: i64,
        path: SubmissionPath,
    ) -> Result<std::result::Result<SubmissionPlan, SubmissionRejection>> {
        let now = self.clock.now();
        let existing = self.store.load_report(user_id, self.policy.business_date(&now)).await?;
        Ok(self.policy.plan_submission(existing.as_ref(), &now, path))
    }

    /// Create the planned half and settle the author, saved together
    pub async fn submit(
        &self,
        author: &mut User,
        text: &str,
        path: SubmissionPath,
    ) -> Result<Submission> {
        let now = self.clock.now();
        let date = self.policy.business_date(&now);
        let existing = self.store.load_report(author.id, date).await?;

        let plan = match self.policy.plan_submission(existing.as_ref(), &now, path) {
            Ok(plan) => plan,
            Err(rejection) => return Ok(Submission::Rejected(rejection)),
        };

        let mut report = existing.unwrap_or_else(|| Report::new(author.id, date));
        let half = ReportHalf::new(
            text.to_string(),
            now.with_timezone(&Utc),
            plan.overdue,
            plan.approved_by_system,
        );
        report.insert_half(plan.half, half)?;
        author.settle()?;

        self.store
            .save(vec![Mutation::User(author.clone()), Mutation::Report(report.clone())])
            .await?;

        info!(
            user_id = author.id,
            date = %date,
            half = plan.half.as_str(),
            overdue_seconds = plan.overdue.map(|d| d.num_seconds()),
            "Report half submitted"
        );
        Ok(Submission::Created { report, plan })
    }

    /// Approve a half; `None` when it no longer exists
    pub async fn approve(
        &self,
        reviewer_id: i64,
        target: ReportRef,
    ) -> Result<Option<(Report, Approval)>> {
        let Some(mut report) = self.store.load_report(target.author_id, target.date).await? else {
            return Ok(None);
        };
        let Some(half) = report.half_mut(target.half) else {
            return Ok(None);
        };

        let approval = half.approve(reviewer_id);
        if approval == Approval::Approved {
            self.store.save(vec![Mutation::Report(report.clone())]).await?;
            info!(
                reviewer_id = reviewer_id,
                author_id = target.author_id,
                half = target.half.as_str(),
                "Report half approved"
            );
        }
        Ok(Some((report, approval)))
    }

    /// Remove the half the reviewer is rejecting and settle the reviewer
    ///
    /// A report left without halves is deleted. Returns the removed half.
    pub async fn reject(
        &self,
        reviewer: &mut User,
        target: ReportRef,
    ) -> Result<Option<ReportHalf>> {
        let mut report = self.store.load_report(target.author_id, target.date).await?;
        let removed = report.as_mut().and_then(|r| r.remove_half(target.half));

        reviewer.settle()?;
        let mut mutations = vec![Mutation::User(reviewer.clone())];
        if let (Some(report), Some(_)) = (report, removed.as_ref()) {
            mutations.push(if report.is_empty() {
                Mutation::Delete(Entity::Report { user_id: report.user_id, date: report.date })
            } else {
                Mutation::Report(report)
            });
        }
        self.store.save(mutations).await?;

        if removed.is_some() {
            info!(
                reviewer_id = reviewer.id,
                author_id = target.author_id,
                half = target.half.as_str(),
                "Report half rejected"
            );
        }
        Ok(removed)
    }

    pub async fn load_half(&self, target: ReportRef) -> Result<Option<ReportHalf>> {
        Ok(self
            .store
            .load_report(target.author_id, target.date)
            .await?
            .and_then(|r| r.half(target.half).cloned()))
    }

    /// Everyone who should see `author`'s reports, excluding the author
    pub async fn reviewers_of(&self, author_id: i64) -> Result<Vec<User>> {
        Ok(self
            .store
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.id != author_id && u.can_review())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Half, Role};
    use crate::policy::{EveningGate, FixedClock, Window};
    use crate::state::{Pending, ReviewPointer, State};
    use assert_matches::assert_matches;
    use chrono::NaiveTime;
    use chrono_tz::Europe::Moscow;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn policy() -> WindowPolicy {
        WindowPolicy::new(
            Moscow,
            Window::new(hm(8, 0), hm(10, 0)).unwrap(),
            Window::new(hm(17, 0), hm(20, 0)).unwrap(),
            EveningGate::RequireMorning,
        )
        .unwrap()
    }

    fn setup(hour: u32, minute: u32) -> (Arc<MemoryStore>, Arc<FixedClock>, ReportService) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at_local(Moscow, 2026, 10, 19, hour, minute).unwrap());
        let service = ReportService::new(store.clone(), clock.clone(), policy());
        (store, clock, service)
    }

    fn drafting(id: i64) -> User {
        let mut user = User::new(id, id, None, Role::Employee, Utc::now());
        user.full_name = Some("Ivan Petrov".into());
        user.position = Some("Engineer".into());
        user.transition(
            State::AwaitingReportConfirmation,
            Pending::Draft { text: "plan".into(), score: Some(8) },
        )
        .unwrap();
        user
    }

    #[tokio::test]
    async fn test_submit_saves_user_and_report_together() {
        let (store, _, service) = setup(9, 0);
        let mut author = drafting(2);

        let outcome = service.submit(&mut author, "plan", SubmissionPath::Analyzed).await.unwrap();
        assert_matches!(
            outcome,
            Submission::Created { plan, .. } if plan.half == Half::Morning && plan.overdue.is_none()
        );
        assert_eq!(author.state(), State::AwaitingReportInput);
        assert_eq!(store.save_count(), 1);

        let stored = store.load_user(2).await.unwrap().unwrap();
        assert_eq!(stored.state(), State::AwaitingReportInput);
        assert_eq!(store.reports_of(2).await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_submission_in_window_rejected() {
        let (store, _, service) = setup(9, 0);
        let mut author = drafting(2);
        service.submit(&mut author, "plan", SubmissionPath::Analyzed).await.unwrap();

        let mut again = drafting(2);
        let outcome = service
            .submit(&mut again, "plan again", SubmissionPath::Analyzed)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Submission::Rejected(SubmissionRejection::AlreadySubmitted(Half::Morning))
        );
        assert_eq!(again.state(), State::AwaitingReportConfirmation);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_forced_late_morning_is_system_approved() {
        let (_, _, service) = setup(12, 30);
        let mut author = drafting(2);

        let outcome = service.submit(&mut author, "late", SubmissionPath::Forced).await.unwrap();
        let Submission::Created { report, plan } = outcome else {
            panic!("expected a created half");
        };
        assert_eq!(plan.half, Half::Morning);
        assert_eq!(plan.overdue, Some(chrono::Duration::minutes(150)));
        assert!(report.morning.unwrap().is_approved_by_system());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_nothing() {
        let (store, _, service) = setup(9, 0);
        store.fail_next_save();
        let mut author = drafting(2);
        assert!(service.submit(&mut author, "plan", SubmissionPath::Analyzed).await.is_err());
        assert!(store.reports_of(2).await.is_empty());
        assert!(store.load_user(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approve_is_idempotent() {
        let (_, _, service) = setup(9, 0);
        let mut author = drafting(2);
        service.submit(&mut author, "plan", SubmissionPath::Analyzed).await.unwrap();
        let target = ReportRef { author_id: 2, date: service.today(), half: Half::Morning };

        let (_, first) = service.approve(1, target).await.unwrap().unwrap();
        let (report, second) = service.approve(3, target).await.unwrap().unwrap();
        assert_eq!(first, Approval::Approved);
        assert_eq!(second, Approval::AlreadyApproved);
        assert_eq!(report.morning.unwrap().approved_by(), Some(1));

        let missing = ReportRef { half: Half::Evening, ..target };
        assert!(service.approve(1, missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reject_last_half_deletes_report() {
        let (store, _, service) = setup(9, 0);
        let mut author = drafting(2);
        service.submit(&mut author, "plan", SubmissionPath::Analyzed).await.unwrap();
        let target = ReportRef { author_id: 2, date: service.today(), half: Half::Morning };

        let mut reviewer = User::new(1, 1, None, Role::Admin, Utc::now());
        reviewer.full_name = Some("Anna Smirnova".into());
        reviewer.position = Some("Lead".into());
        reviewer.settle().unwrap();
        reviewer
            .transition(
                State::AwaitingRejectCommentInput,
                Pending::Reviewing(ReviewPointer { report: target }),
            )
            .unwrap();

        let removed = service.reject(&mut reviewer, target).await.unwrap();
        assert_eq!(removed.map(|h| h.data), Some("plan".to_string()));
        assert_eq!(reviewer.state(), State::Idle);
        assert!(store.reports_of(2).await.is_empty());

        // rejecting again only settles the reviewer
        reviewer
            .transition(
                State::AwaitingRejectCommentInput,
                Pending::Reviewing(ReviewPointer { report: target }),
            )
            .unwrap();
        assert!(service.reject(&mut reviewer, target).await.unwrap().is_none());
        assert_eq!(reviewer.state(), State::Idle);
    }
}
