//! Event resolution
//!
//! Maps `(user, event)` to at most one [`Command`]. Resolution is pure: it
//! reads the user as loaded inside the user's section and touches nothing else,
//! so the same pair always resolves the same way.

use crate::commands::command::{AdminFlow, Command};
use crate::commands::event::{Button, ChatKind, EventKind, InboundEvent, Keyword};
use crate::models::User;
use crate::state::State;
use crate::utils::helpers::parse_user_id;

/// Resolve an event for `user`, `None` when it is not a registered user yet
pub fn resolve(user: Option<&User>, event: &InboundEvent) -> Option<Command> {
    let Some(user) = user else {
        return match (&event.kind, event.chat_kind) {
            (EventKind::Start, ChatKind::Private) => Some(Command::Bootstrap),
            _ => None,
        };
    };

    if user.is_blocked() {
        return None;
    }

    match &event.kind {
        EventKind::Start => {
            (event.is_private() && user.state().is_settled()).then_some(Command::Greet)
        }
        EventKind::Keyword(keyword) => resolve_keyword(user, *keyword, event.chat_kind),
        // only a cancel leaves a flow whose rights were revoked meanwhile
        EventKind::Button(Button::Cancel) => {
            user.state().is_cancellable().then_some(Command::Cancel)
        }
        _ if !user.may_continue_flow() => None,
        EventKind::Button(button) => resolve_button(user, button),
        EventKind::Text(text) if event.is_private() => resolve_text(user, text),
        EventKind::UserPicked(target) if event.is_private() => resolve_user_pick(user, *target),
        EventKind::ChatPicked(chat_id) if event.is_private() => resolve_chat_pick(user, *chat_id),
        _ => None,
    }
}

fn resolve_keyword(user: &User, keyword: Keyword, chat_kind: ChatKind) -> Option<Command> {
    if !user.state().is_settled() || !user.role.is_admin() {
        return None;
    }

    let flow = match keyword {
        Keyword::RegisterChat => {
            return (chat_kind == ChatKind::Group).then_some(Command::RegisterWorkingChat);
        }
        _ if chat_kind != ChatKind::Private => return None,
        Keyword::ListUsers => return Some(Command::ListUsers),
        Keyword::AddExaminer => AdminFlow::AddExaminer,
        Keyword::RemoveExaminer => AdminFlow::RemoveExaminer,
        Keyword::AssignAdmin => AdminFlow::AssignAdmin,
        Keyword::AssignTeleAdmin => AdminFlow::AssignTeleAdmin,
        Keyword::DemoteAdmin => AdminFlow::DemoteAdmin,
        Keyword::BlockUser => AdminFlow::BlockUser,
        Keyword::UnblockUser => AdminFlow::UnblockUser,
        Keyword::SetWorkingChat => AdminFlow::SetWorkingChat,
        Keyword::EditName => AdminFlow::EditName,
        Keyword::EditPosition => AdminFlow::EditPosition,
    };
    Some(Command::BeginAdminFlow(flow))
}

fn resolve_button(user: &User, button: &Button) -> Option<Command> {
    let state = user.state();
    match button {
        Button::Cancel => state.is_cancellable().then_some(Command::Cancel),
        Button::ConfirmReport => {
            (state == State::AwaitingReportConfirmation).then_some(Command::ConfirmReport)
        }
        Button::ForceSend => {
            (state == State::AwaitingReportConfirmation).then_some(Command::ForceSendReport)
        }
        Button::Approve(report) | Button::Reject(report) | Button::Comment(report) => {
            if !state.is_settled() || !user.can_review() || report.author_id == user.id {
                return None;
            }
            Some(match button {
                Button::Approve(_) => Command::Approve(*report),
                Button::Reject(_) => Command::StartReject(*report),
                _ => Command::StartComment(*report),
            })
        }
        Button::Answer { reviewer_id, report } => {
            (state.is_settled() && report.author_id == user.id && *reviewer_id != user.id)
                .then_some(Command::StartAnswer { reviewer_id: *reviewer_id, report: *report })
        }
    }
}

fn resolve_text(user: &User, text: &str) -> Option<Command> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let state = user.state();
    match state {
        State::AwaitingFullNameInput => Some(Command::SubmitFullName(text.to_string())),
        State::AwaitingPositionInput => Some(Command::SubmitPosition(text.to_string())),
        State::AwaitingReportInput if user.role.submits_reports() => {
            Some(Command::AnalyzeReport(text.to_string()))
        }
        State::AwaitingCommentInput => Some(Command::SubmitComment(text.to_string())),
        State::AwaitingRejectCommentInput => Some(Command::SubmitRejectComment(text.to_string())),
        State::AwaitingAnswerInput => Some(Command::SubmitAnswer(text.to_string())),
        State::AwaitingNameForEdit | State::AwaitingPositionForEdit if user.role.is_admin() => {
            Some(Command::SubmitEditedText(text.to_string()))
        }
        State::AwaitingChatIdForWorkingChat => {
            text.parse::<i64>().ok().and_then(|chat_id| resolve_chat_pick(user, chat_id))
        }
        _ if AdminFlow::awaiting_user(state).is_some() => {
            parse_user_id(text).and_then(|target| resolve_user_pick(user, target))
        }
        _ => None,
    }
}

fn resolve_user_pick(user: &User, target: i64) -> Option<Command> {
    if !user.role.is_admin() {
        return None;
    }
    let flow = AdminFlow::awaiting_user(user.state())?;
    if flow.edits_text() {
        Some(Command::SelectEditTarget { flow, target })
    } else {
        Some(Command::ApplyAdminAction { flow, target })
    }
}

fn resolve_chat_pick(user: &User, chat_id: i64) -> Option<Command> {
    (user.role.is_admin() && user.state() == State::AwaitingChatIdForWorkingChat)
        .then_some(Command::PickWorkingChat(chat_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Half, ReportRef, Role};
    use crate::state::{Pending, ReviewPointer};
    use chrono::{NaiveDate, Utc};

    const ADMIN: i64 = 1;
    const EMPLOYEE: i64 = 2;

    fn report_of(author_id: i64) -> ReportRef {
        ReportRef {
            author_id,
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            half: Half::Morning,
        }
    }

    fn registered(id: i64, role: Role) -> User {
        let mut user = User::new(id, id, None, role, Utc::now());
        user.full_name = Some("Ivan Petrov".into());
        user.position = Some("Engineer".into());
        user.settle().unwrap();
        user
    }

    fn text(user_id: i64, body: &str) -> InboundEvent {
        InboundEvent::private(user_id, EventKind::Text(body.to_string()))
    }

    fn button(user_id: i64, button: Button) -> InboundEvent {
        InboundEvent::private(user_id, EventKind::Button(button))
    }

    #[test]
    fn test_unknown_user_only_bootstraps() {
        assert_eq!(
            resolve(None, &InboundEvent::private(5, EventKind::Start)),
            Some(Command::Bootstrap)
        );
        assert_eq!(resolve(None, &InboundEvent::in_group(5, -10, EventKind::Start)), None);
        assert_eq!(resolve(None, &text(5, "hello")), None);
        assert_eq!(resolve(None, &button(5, Button::Cancel)), None);
    }

    #[test]
    fn test_blocked_user_resolves_nothing() {
        let mut user = registered(EMPLOYEE, Role::Employee);
        user.block();
        for kind in [
            EventKind::Start,
            EventKind::Text("report".into()),
            EventKind::Keyword(Keyword::ListUsers),
            EventKind::Button(Button::Cancel),
            EventKind::Button(Button::ConfirmReport),
            EventKind::UserPicked(3),
        ] {
            assert_eq!(resolve(Some(&user), &InboundEvent::private(EMPLOYEE, kind)), None);
        }
    }

    #[test]
    fn test_registration_text() {
        let mut user = User::new(EMPLOYEE, EMPLOYEE, None, Role::Employee, Utc::now());
        assert_eq!(
            resolve(Some(&user), &text(EMPLOYEE, "  Ivan Petrov ")),
            Some(Command::SubmitFullName("Ivan Petrov".into()))
        );
        assert_eq!(resolve(Some(&user), &text(EMPLOYEE, "   ")), None);
        assert_eq!(resolve(Some(&user), &InboundEvent::private(EMPLOYEE, EventKind::Start)), None);

        user.full_name = Some("Ivan Petrov".into());
        user.transition(State::AwaitingPositionInput, Pending::None).unwrap();
        assert_eq!(
            resolve(Some(&user), &text(EMPLOYEE, "Engineer")),
            Some(Command::SubmitPosition("Engineer".into()))
        );
    }

    #[test]
    fn test_report_text_and_confirmation() {
        let mut user = registered(EMPLOYEE, Role::Employee);
        assert_eq!(
            resolve(Some(&user), &text(EMPLOYEE, "did things")),
            Some(Command::AnalyzeReport("did things".into()))
        );
        assert_eq!(resolve(Some(&user), &button(EMPLOYEE, Button::ConfirmReport)), None);
        assert_eq!(resolve(Some(&user), &button(EMPLOYEE, Button::Cancel)), None);

        user.transition(
            State::AwaitingReportConfirmation,
            Pending::Draft { text: "did things".into(), score: Some(8) },
        )
        .unwrap();
        assert_eq!(
            resolve(Some(&user), &button(EMPLOYEE, Button::ConfirmReport)),
            Some(Command::ConfirmReport)
        );
        assert_eq!(
            resolve(Some(&user), &button(EMPLOYEE, Button::ForceSend)),
            Some(Command::ForceSendReport)
        );
        assert_eq!(resolve(Some(&user), &button(EMPLOYEE, Button::Cancel)), Some(Command::Cancel));
        assert_eq!(resolve(Some(&user), &text(EMPLOYEE, "another report")), None);
    }

    #[test]
    fn test_text_in_group_is_ignored() {
        let user = registered(EMPLOYEE, Role::Employee);
        let event = InboundEvent::in_group(EMPLOYEE, -100, EventKind::Text("hi".into()));
        assert_eq!(resolve(Some(&user), &event), None);
    }

    #[test]
    fn test_admin_keywords() {
        let admin = registered(ADMIN, Role::Admin);
        let employee = registered(EMPLOYEE, Role::Employee);
        let block = EventKind::Keyword(Keyword::BlockUser);

        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, block.clone())),
            Some(Command::BeginAdminFlow(AdminFlow::BlockUser))
        );
        assert_eq!(resolve(Some(&employee), &InboundEvent::private(EMPLOYEE, block.clone())), None);
        assert_eq!(resolve(Some(&admin), &InboundEvent::in_group(ADMIN, -100, block)), None);

        let register = EventKind::Keyword(Keyword::RegisterChat);
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::in_group(ADMIN, -100, register.clone())),
            Some(Command::RegisterWorkingChat)
        );
        assert_eq!(resolve(Some(&admin), &InboundEvent::private(ADMIN, register)), None);
    }

    #[test]
    fn test_keywords_need_settled_state() {
        let mut admin = registered(ADMIN, Role::Admin);
        admin.transition(State::AwaitingUserIdForBlock, Pending::None).unwrap();
        let event = InboundEvent::private(ADMIN, EventKind::Keyword(Keyword::ListUsers));
        assert_eq!(resolve(Some(&admin), &event), None);
    }

    #[test]
    fn test_user_picks() {
        let mut admin = registered(ADMIN, Role::Admin);
        admin.transition(State::AwaitingUserIdForBlock, Pending::None).unwrap();
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, EventKind::UserPicked(7))),
            Some(Command::ApplyAdminAction { flow: AdminFlow::BlockUser, target: 7 })
        );
        assert_eq!(
            resolve(Some(&admin), &text(ADMIN, " 7 ")),
            Some(Command::ApplyAdminAction { flow: AdminFlow::BlockUser, target: 7 })
        );
        assert_eq!(resolve(Some(&admin), &text(ADMIN, "seven")), None);

        admin.transition(State::AwaitingUserIdForEditName, Pending::None).unwrap();
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, EventKind::UserPicked(7))),
            Some(Command::SelectEditTarget { flow: AdminFlow::EditName, target: 7 })
        );

        let idle = registered(ADMIN, Role::Admin);
        assert_eq!(
            resolve(Some(&idle), &InboundEvent::private(ADMIN, EventKind::UserPicked(7))),
            None
        );
    }

    #[test]
    fn test_demoted_admin_cannot_finish_flow() {
        let mut admin = registered(ADMIN, Role::Admin);
        admin.transition(State::AwaitingUserIdForBlock, Pending::None).unwrap();
        admin.set_role(Role::Employee).unwrap();
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, EventKind::UserPicked(7))),
            None
        );
        assert_eq!(resolve(Some(&admin), &button(ADMIN, Button::Cancel)), Some(Command::Cancel));
    }

    #[test]
    fn test_revoked_reviewer_cannot_submit_comment() {
        let mut examiner = registered(EMPLOYEE, Role::Employee);
        examiner.is_examiner = true;
        let pointer = Pending::Reviewing(ReviewPointer { report: report_of(3) });
        examiner.transition(State::AwaitingRejectCommentInput, pointer).unwrap();
        assert_eq!(
            resolve(Some(&examiner), &text(EMPLOYEE, "not enough detail")),
            Some(Command::SubmitRejectComment("not enough detail".into()))
        );

        examiner.is_examiner = false;
        assert_eq!(resolve(Some(&examiner), &text(EMPLOYEE, "not enough detail")), None);
        assert_eq!(
            resolve(Some(&examiner), &button(EMPLOYEE, Button::Cancel)),
            Some(Command::Cancel)
        );
    }

    #[test]
    fn test_promoted_author_cannot_confirm_draft() {
        let mut author = registered(EMPLOYEE, Role::Employee);
        let draft = Pending::Draft { text: "Plan: ship".into(), score: Some(8) };
        author.transition(State::AwaitingReportConfirmation, draft).unwrap();
        author.set_role(Role::Admin).unwrap();

        assert_eq!(resolve(Some(&author), &button(EMPLOYEE, Button::ConfirmReport)), None);
        assert_eq!(resolve(Some(&author), &button(EMPLOYEE, Button::ForceSend)), None);
        assert_eq!(
            resolve(Some(&author), &button(EMPLOYEE, Button::Cancel)),
            Some(Command::Cancel)
        );
    }

    #[test]
    fn test_working_chat_flow() {
        let mut admin = registered(ADMIN, Role::Admin);
        admin.transition(State::AwaitingChatIdForWorkingChat, Pending::None).unwrap();
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, EventKind::ChatPicked(-100))),
            Some(Command::PickWorkingChat(-100))
        );
        assert_eq!(
            resolve(Some(&admin), &text(ADMIN, "-100")),
            Some(Command::PickWorkingChat(-100))
        );

        admin
            .transition(
                State::AwaitingUserIdForWorkingChat,
                Pending::SelectedWorkingChat { chat_id: -100 },
            )
            .unwrap();
        assert_eq!(
            resolve(Some(&admin), &InboundEvent::private(ADMIN, EventKind::UserPicked(2))),
            Some(Command::ApplyAdminAction { flow: AdminFlow::SetWorkingChat, target: 2 })
        );
    }

    #[test]
    fn test_review_buttons() {
        let admin = registered(ADMIN, Role::Admin);
        let mut examiner = registered(3, Role::Employee);
        examiner.is_examiner = true;
        let employee = registered(EMPLOYEE, Role::Employee);
        let report = report_of(EMPLOYEE);

        assert_eq!(
            resolve(Some(&admin), &button(ADMIN, Button::Approve(report))),
            Some(Command::Approve(report))
        );
        assert_eq!(
            resolve(Some(&examiner), &button(3, Button::Reject(report))),
            Some(Command::StartReject(report))
        );
        assert_eq!(
            resolve(Some(&admin), &button(ADMIN, Button::Comment(report))),
            Some(Command::StartComment(report))
        );
        assert_eq!(resolve(Some(&employee), &button(EMPLOYEE, Button::Approve(report))), None);
        assert_eq!(resolve(Some(&examiner), &button(3, Button::Approve(report_of(3)))), None);

        // review buttons also arrive from the working chat
        let from_group =
            InboundEvent::in_group(ADMIN, -100, EventKind::Button(Button::Approve(report)));
        assert_eq!(resolve(Some(&admin), &from_group), Some(Command::Approve(report)));
    }

    #[test]
    fn test_review_input_states() {
        let mut admin = registered(ADMIN, Role::Admin);
        let pointer = Pending::Reviewing(ReviewPointer { report: report_of(EMPLOYEE) });
        admin.transition(State::AwaitingRejectCommentInput, pointer.clone()).unwrap();
        assert_eq!(
            resolve(Some(&admin), &text(ADMIN, "too short")),
            Some(Command::SubmitRejectComment("too short".into()))
        );
        assert_eq!(
            resolve(Some(&admin), &button(ADMIN, Button::Approve(report_of(EMPLOYEE)))),
            None
        );

        admin.transition(State::AwaitingCommentInput, pointer).unwrap();
        assert_eq!(
            resolve(Some(&admin), &text(ADMIN, "nice")),
            Some(Command::SubmitComment("nice".into()))
        );
    }

    #[test]
    fn test_answer_button_only_for_author() {
        let employee = registered(EMPLOYEE, Role::Employee);
        let answer = Button::Answer { reviewer_id: ADMIN, report: report_of(EMPLOYEE) };
        assert_eq!(
            resolve(Some(&employee), &button(EMPLOYEE, answer)),
            Some(Command::StartAnswer { reviewer_id: ADMIN, report: report_of(EMPLOYEE) })
        );
        let other = registered(4, Role::Employee);
        assert_eq!(resolve(Some(&other), &button(4, answer)), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let admin = registered(ADMIN, Role::Admin);
        let event = button(ADMIN, Button::Approve(report_of(EMPLOYEE)));
        let first = resolve(Some(&admin), &event);
        for _ in 0..10 {
            assert_eq!(resolve(Some(&admin), &event), first);
        }
    }
}
