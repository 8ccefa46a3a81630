//! User state machine
//!
//! Every user is in exactly one [`State`]. States that belong to a multi-step
//! flow carry exactly one [`Pending`] pointer, and the two are only ever changed
//! together through [`crate::models::User::transition`].

use serde::{Deserialize, Serialize};

use crate::models::ReportRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum State {
    Idle,
    AwaitingFullNameInput,
    AwaitingPositionInput,
    AwaitingReportInput,
    AwaitingReportConfirmation,
    AwaitingCommentInput,
    AwaitingRejectCommentInput,
    AwaitingAnswerInput,
    AwaitingUserIdForAddExaminer,
    AwaitingUserIdForRemoveExaminer,
    AwaitingUserIdForAssignAdmin,
    AwaitingUserIdForAssignTeleAdmin,
    AwaitingUserIdForDemoteAdmin,
    AwaitingUserIdForBlock,
    AwaitingUserIdForUnblock,
    AwaitingChatIdForWorkingChat,
    AwaitingUserIdForWorkingChat,
    AwaitingUserIdForEditName,
    AwaitingNameForEdit,
    AwaitingUserIdForEditPosition,
    AwaitingPositionForEdit,
    Blocked,
}

/// Which pending pointer a state requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    None,
    Draft,
    Reviewing,
    Answering,
    SelectedUser,
    SelectedWorkingChat,
}

/// Pointer a reviewer holds while typing a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPointer {
    pub report: ReportRef,
}

/// Pointer an author holds while typing an answer to a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPointer {
    pub reviewer_id: i64,
    pub report: ReportRef,
}

/// The single in-flight workflow pointer of a user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pending {
    #[default]
    None,
    /// Report text awaiting confirmation
    Draft { text: String, score: Option<u8> },
    Reviewing(ReviewPointer),
    Answering(AnswerPointer),
    SelectedUser { user_id: i64 },
    SelectedWorkingChat { chat_id: i64 },
}

impl Pending {
    pub fn kind(&self) -> PendingKind {
        match self {
            Pending::None => PendingKind::None,
            Pending::Draft { .. } => PendingKind::Draft,
            Pending::Reviewing(_) => PendingKind::Reviewing,
            Pending::Answering(_) => PendingKind::Answering,
            Pending::SelectedUser { .. } => PendingKind::SelectedUser,
            Pending::SelectedWorkingChat { .. } => PendingKind::SelectedWorkingChat,
        }
    }
}

impl State {
    /// The pointer that must accompany this state
    pub fn pending_kind(&self) -> PendingKind {
        match self {
            State::AwaitingReportConfirmation => PendingKind::Draft,
            State::AwaitingCommentInput | State::AwaitingRejectCommentInput => {
                PendingKind::Reviewing
            }
            State::AwaitingAnswerInput => PendingKind::Answering,
            State::AwaitingUserIdForWorkingChat => PendingKind::SelectedWorkingChat,
            State::AwaitingNameForEdit | State::AwaitingPositionForEdit => {
                PendingKind::SelectedUser
            }
            State::Idle
            | State::AwaitingFullNameInput
            | State::AwaitingPositionInput
            | State::AwaitingReportInput
            | State::AwaitingUserIdForAddExaminer
            | State::AwaitingUserIdForRemoveExaminer
            | State::AwaitingUserIdForAssignAdmin
            | State::AwaitingUserIdForAssignTeleAdmin
            | State::AwaitingUserIdForDemoteAdmin
            | State::AwaitingUserIdForBlock
            | State::AwaitingUserIdForUnblock
            | State::AwaitingChatIdForWorkingChat
            | State::AwaitingUserIdForEditName
            | State::AwaitingUserIdForEditPosition
            | State::Blocked => PendingKind::None,
        }
    }

    /// States flows return to on completion, cancellation or terminal error
    pub fn is_settled(&self) -> bool {
        matches!(self, State::Idle | State::AwaitingReportInput)
    }

    /// Registration states are left only by completing registration
    pub fn is_registration(&self) -> bool {
        matches!(self, State::AwaitingFullNameInput | State::AwaitingPositionInput)
    }

    /// A flow that can be abandoned with the cancel button
    pub fn is_cancellable(&self) -> bool {
        !self.is_settled() && !self.is_registration() && *self != State::Blocked
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::AwaitingFullNameInput => "awaiting_full_name_input",
            State::AwaitingPositionInput => "awaiting_position_input",
            State::AwaitingReportInput => "awaiting_report_input",
            State::AwaitingReportConfirmation => "awaiting_report_confirmation",
            State::AwaitingCommentInput => "awaiting_comment_input",
            State::AwaitingRejectCommentInput => "awaiting_reject_comment_input",
            State::AwaitingAnswerInput => "awaiting_answer_input",
            State::AwaitingUserIdForAddExaminer => "awaiting_user_id_for_add_examiner",
            State::AwaitingUserIdForRemoveExaminer => "awaiting_user_id_for_remove_examiner",
            State::AwaitingUserIdForAssignAdmin => "awaiting_user_id_for_assign_admin",
            State::AwaitingUserIdForAssignTeleAdmin => "awaiting_user_id_for_assign_tele_admin",
            State::AwaitingUserIdForDemoteAdmin => "awaiting_user_id_for_demote_admin",
            State::AwaitingUserIdForBlock => "awaiting_user_id_for_block",
            State::AwaitingUserIdForUnblock => "awaiting_user_id_for_unblock",
            State::AwaitingChatIdForWorkingChat => "awaiting_chat_id_for_working_chat",
            State::AwaitingUserIdForWorkingChat => "awaiting_user_id_for_working_chat",
            State::AwaitingUserIdForEditName => "awaiting_user_id_for_edit_name",
            State::AwaitingNameForEdit => "awaiting_name_for_edit",
            State::AwaitingUserIdForEditPosition => "awaiting_user_id_for_edit_position",
            State::AwaitingPositionForEdit => "awaiting_position_for_edit",
            State::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_states() {
        assert!(State::Idle.is_settled());
        assert!(State::AwaitingReportInput.is_settled());
        assert!(!State::AwaitingCommentInput.is_settled());
        assert!(!State::Blocked.is_settled());
    }

    #[test]
    fn test_pointer_states_require_pointer() {
        assert_eq!(State::AwaitingReportConfirmation.pending_kind(), PendingKind::Draft);
        assert_eq!(State::AwaitingRejectCommentInput.pending_kind(), PendingKind::Reviewing);
        assert_eq!(
            State::AwaitingUserIdForWorkingChat.pending_kind(),
            PendingKind::SelectedWorkingChat
        );
        assert_eq!(State::AwaitingUserIdForBlock.pending_kind(), PendingKind::None);
    }

    #[test]
    fn test_cancellable_states() {
        assert!(State::AwaitingCommentInput.is_cancellable());
        assert!(State::AwaitingUserIdForBlock.is_cancellable());
        assert!(!State::AwaitingFullNameInput.is_cancellable());
        assert!(!State::Idle.is_cancellable());
        assert!(!State::Blocked.is_cancellable());
    }

    #[test]
    fn test_pending_serializes_tagged() {
        let pending = Pending::SelectedUser { user_id: 42 };
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["kind"], "selected_user");
        let back: Pending = serde_json::from_value(json).unwrap();
        assert_eq!(back, pending);
    }
}
