//! Resolved commands
//!
//! A [`Command`] is what an inbound event means for a user in a given state.
//! Whether it runs inline or on the background queue is a property of the
//! variant, fixed by [`Command::execution`].

use crate::models::{ReportRef, User};
use crate::state::State;

/// Where a command body runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Under the inline timeout, while the event is being dispatched
    Inline,
    /// On the background queue, re-validated against the user's state
    Background,
}

/// Multi-step administrative flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminFlow {
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
}

impl AdminFlow {
    /// State a flow waits in for its first input
    pub fn first_state(&self) -> State {
        match self {
            AdminFlow::AddExaminer => State::AwaitingUserIdForAddExaminer,
            AdminFlow::RemoveExaminer => State::AwaitingUserIdForRemoveExaminer,
            AdminFlow::AssignAdmin => State::AwaitingUserIdForAssignAdmin,
            AdminFlow::AssignTeleAdmin => State::AwaitingUserIdForAssignTeleAdmin,
            AdminFlow::DemoteAdmin => State::AwaitingUserIdForDemoteAdmin,
            AdminFlow::BlockUser => State::AwaitingUserIdForBlock,
            AdminFlow::UnblockUser => State::AwaitingUserIdForUnblock,
            AdminFlow::SetWorkingChat => State::AwaitingChatIdForWorkingChat,
            AdminFlow::EditName => State::AwaitingUserIdForEditName,
            AdminFlow::EditPosition => State::AwaitingUserIdForEditPosition,
        }
    }

    /// The flow whose user-pick step is `state`
    pub fn awaiting_user(state: State) -> Option<Self> {
        match state {
            State::AwaitingUserIdForAddExaminer => Some(AdminFlow::AddExaminer),
            State::AwaitingUserIdForRemoveExaminer => Some(AdminFlow::RemoveExaminer),
            State::AwaitingUserIdForAssignAdmin => Some(AdminFlow::AssignAdmin),
            State::AwaitingUserIdForAssignTeleAdmin => Some(AdminFlow::AssignTeleAdmin),
            State::AwaitingUserIdForDemoteAdmin => Some(AdminFlow::DemoteAdmin),
            State::AwaitingUserIdForBlock => Some(AdminFlow::BlockUser),
            State::AwaitingUserIdForUnblock => Some(AdminFlow::UnblockUser),
            State::AwaitingUserIdForWorkingChat => Some(AdminFlow::SetWorkingChat),
            State::AwaitingUserIdForEditName => Some(AdminFlow::EditName),
            State::AwaitingUserIdForEditPosition => Some(AdminFlow::EditPosition),
            _ => None,
        }
    }

    /// Edit flows pick a user first and then ask for the new text
    pub fn edits_text(&self) -> bool {
        matches!(self, AdminFlow::EditName | AdminFlow::EditPosition)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminFlow::AddExaminer => "add_examiner",
            AdminFlow::RemoveExaminer => "remove_examiner",
            AdminFlow::AssignAdmin => "assign_admin",
            AdminFlow::AssignTeleAdmin => "assign_tele_admin",
            AdminFlow::DemoteAdmin => "demote_admin",
            AdminFlow::BlockUser => "block_user",
            AdminFlow::UnblockUser => "unblock_user",
            AdminFlow::SetWorkingChat => "set_working_chat",
            AdminFlow::EditName => "edit_name",
            AdminFlow::EditPosition => "edit_position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// First contact: create the user and start registration
    Bootstrap,
    Greet,
    SubmitFullName(String),
    SubmitPosition(String),
    /// Score a report text and ask for confirmation
    AnalyzeReport(String),
    ConfirmReport,
    /// Submit the draft without a passing score
    ForceSendReport,
    Approve(ReportRef),
    StartComment(ReportRef),
    SubmitComment(String),
    StartReject(ReportRef),
    SubmitRejectComment(String),
    StartAnswer { reviewer_id: i64, report: ReportRef },
    SubmitAnswer(String),
    Cancel,
    BeginAdminFlow(AdminFlow),
    /// Apply a flow to the picked user
    ApplyAdminAction { flow: AdminFlow, target: i64 },
    /// Remember the user whose name or position is about to be edited
    SelectEditTarget { flow: AdminFlow, target: i64 },
    SubmitEditedText(String),
    PickWorkingChat(i64),
    ListUsers,
    RegisterWorkingChat,
}

impl Command {
    pub fn execution(&self) -> Execution {
        match self {
            Command::AnalyzeReport(_)
            | Command::ConfirmReport
            | Command::ForceSendReport
            | Command::ListUsers => Execution::Background,
            Command::Bootstrap
            | Command::Greet
            | Command::SubmitFullName(_)
            | Command::SubmitPosition(_)
            | Command::Approve(_)
            | Command::StartComment(_)
            | Command::SubmitComment(_)
            | Command::StartReject(_)
            | Command::SubmitRejectComment(_)
            | Command::StartAnswer { .. }
            | Command::SubmitAnswer(_)
            | Command::Cancel
            | Command::BeginAdminFlow(_)
            | Command::ApplyAdminAction { .. }
            | Command::SelectEditTarget { .. }
            | Command::SubmitEditedText(_)
            | Command::PickWorkingChat(_)
            | Command::RegisterWorkingChat => Execution::Inline,
        }
    }

    /// Read-only commands run without entering any user section
    pub fn needs_section(&self) -> bool {
        !matches!(self, Command::ListUsers)
    }

    /// Every user whose record the command may change, the actor included
    pub fn affected_users(&self, actor_id: i64, actor: Option<&User>) -> Vec<i64> {
        let mut ids = vec![actor_id];
        let other = match self {
            Command::Approve(report) => Some(report.author_id),
            Command::SubmitRejectComment(_) => {
                actor.and_then(|u| u.reviewing_report()).map(|p| p.report.author_id)
            }
            Command::ApplyAdminAction { target, .. } => Some(*target),
            Command::SubmitEditedText(_) => actor.and_then(|u| u.selected_user_id()),
            _ => None,
        };
        if let Some(id) = other {
            if id != actor_id {
                ids.push(id);
            }
        }
        ids
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Bootstrap => "bootstrap",
            Command::Greet => "greet",
            Command::SubmitFullName(_) => "submit_full_name",
            Command::SubmitPosition(_) => "submit_position",
            Command::AnalyzeReport(_) => "analyze_report",
            Command::ConfirmReport => "confirm_report",
            Command::ForceSendReport => "force_send_report",
            Command::Approve(_) => "approve",
            Command::StartComment(_) => "start_comment",
            Command::SubmitComment(_) => "submit_comment",
            Command::StartReject(_) => "start_reject",
            Command::SubmitRejectComment(_) => "submit_reject_comment",
            Command::StartAnswer { .. } => "start_answer",
            Command::SubmitAnswer(_) => "submit_answer",
            Command::Cancel => "cancel",
            Command::BeginAdminFlow(_) => "begin_admin_flow",
            Command::ApplyAdminAction { .. } => "apply_admin_action",
            Command::SelectEditTarget { .. } => "select_edit_target",
            Command::SubmitEditedText(_) => "submit_edited_text",
            Command::PickWorkingChat(_) => "pick_working_chat",
            Command::ListUsers => "list_users",
            Command::RegisterWorkingChat => "register_working_chat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Half, Role};
    use crate::state::{Pending, ReviewPointer};
    use chrono::{NaiveDate, Utc};

    fn report_of(author_id: i64) -> ReportRef {
        ReportRef {
            author_id,
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            half: Half::Morning,
        }
    }

    #[test]
    fn test_slow_commands_run_in_background() {
        assert_eq!(Command::AnalyzeReport("x".into()).execution(), Execution::Background);
        assert_eq!(Command::ConfirmReport.execution(), Execution::Background);
        assert_eq!(Command::ForceSendReport.execution(), Execution::Background);
        assert_eq!(Command::Approve(report_of(2)).execution(), Execution::Inline);
        assert!(!Command::ListUsers.needs_section());
        assert!(Command::ConfirmReport.needs_section());
    }

    #[test]
    fn test_affected_users() {
        assert_eq!(Command::Approve(report_of(2)).affected_users(1, None), vec![1, 2]);
        assert_eq!(Command::Approve(report_of(1)).affected_users(1, None), vec![1]);
        assert_eq!(
            Command::ApplyAdminAction { flow: AdminFlow::BlockUser, target: 9 }
                .affected_users(1, None),
            vec![1, 9]
        );
        assert_eq!(Command::StartComment(report_of(2)).affected_users(1, None), vec![1]);

        let mut reviewer = User::new(1, 1, None, Role::Admin, Utc::now());
        reviewer.full_name = Some("Anna".into());
        reviewer.position = Some("Lead".into());
        reviewer.settle().unwrap();
        reviewer
            .transition(
                State::AwaitingRejectCommentInput,
                Pending::Reviewing(ReviewPointer { report: report_of(7) }),
            )
            .unwrap();
        assert_eq!(
            Command::SubmitRejectComment("no".into()).affected_users(1, Some(&reviewer)),
            vec![1, 7]
        );
        assert_eq!(Command::SubmitRejectComment("no".into()).affected_users(1, None), vec![1]);
    }

    #[test]
    fn test_flow_states_round_trip() {
        for flow in [
            AdminFlow::AddExaminer,
            AdminFlow::RemoveExaminer,
            AdminFlow::AssignAdmin,
            AdminFlow::AssignTeleAdmin,
            AdminFlow::DemoteAdmin,
            AdminFlow::BlockUser,
            AdminFlow::UnblockUser,
            AdminFlow::EditName,
            AdminFlow::EditPosition,
        ] {
            assert_eq!(AdminFlow::awaiting_user(flow.first_state()), Some(flow));
        }
        assert_eq!(AdminFlow::SetWorkingChat.first_state(), State::AwaitingChatIdForWorkingChat);
        assert_eq!(
            AdminFlow::awaiting_user(State::AwaitingUserIdForWorkingChat),
            Some(AdminFlow::SetWorkingChat)
        );
    }
}
