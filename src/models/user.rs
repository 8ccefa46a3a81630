//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::machine::{AnswerPointer, Pending, ReviewPointer, State};
use crate::utils::errors::{ReportBuddyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Admin,
    /// Reviews like an admin but still submits own reports
    TeleAdmin,
    Blocked,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::TeleAdmin)
    }

    pub fn submits_reports(&self) -> bool {
        matches!(self, Role::Employee | Role::TeleAdmin)
    }

    /// The state this role returns to when a flow ends
    pub fn settled_state(&self) -> State {
        match self {
            Role::Admin => State::Idle,
            Role::Employee | Role::TeleAdmin => State::AwaitingReportInput,
            Role::Blocked => State::Blocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Telegram user id
    pub id: i64,
    /// Private chat with the bot
    pub chat_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub role: Role,
    pub is_examiner: bool,
    pub working_chat_id: Option<i64>,
    state: State,
    pending: Pending,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A user seen for the first time starts registration
    pub fn new(
        id: i64,
        chat_id: i64,
        username: Option<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chat_id,
            username,
            full_name: None,
            position: None,
            role,
            is_examiner: false,
            working_chat_id: None,
            state: State::AwaitingFullNameInput,
            pending: Pending::None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from storage, checking the state/pointer pairing
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: i64,
        chat_id: i64,
        username: Option<String>,
        full_name: Option<String>,
        position: Option<String>,
        role: Role,
        is_examiner: bool,
        working_chat_id: Option<i64>,
        state: State,
        pending: Pending,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        if state.pending_kind() != pending.kind() {
            return Err(ReportBuddyError::InvalidStateTransition {
                from: format!("stored pointer {:?}", pending.kind()),
                to: state.to_string(),
            });
        }
        Ok(Self {
            id,
            chat_id,
            username,
            full_name,
            position,
            role,
            is_examiner,
            working_chat_id,
            state,
            pending,
            created_at,
            updated_at,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    pub fn is_blocked(&self) -> bool {
        self.role == Role::Blocked || self.state == State::Blocked
    }

    pub fn can_review(&self) -> bool {
        !self.is_blocked() && (self.role.is_admin() || self.is_examiner)
    }

    /// Whether the user still holds the rights the open flow was started with
    pub fn may_continue_flow(&self) -> bool {
        match self.state {
            State::AwaitingReportConfirmation => self.role.submits_reports(),
            State::AwaitingCommentInput | State::AwaitingRejectCommentInput => self.can_review(),
            State::AwaitingAnswerInput => !self.is_blocked(),
            state if state.is_cancellable() => self.role.is_admin(),
            _ => true,
        }
    }

    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.as_ref().map(|u| format!("@{}", u)))
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Move to `next` carrying `pending`; the pair must match and `Blocked` is absorbing
    pub fn transition(&mut self, next: State, pending: Pending) -> Result<()> {
        if self.state == State::Blocked || next == State::Blocked {
            return Err(ReportBuddyError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        if next.pending_kind() != pending.kind() {
            return Err(ReportBuddyError::InvalidStateTransition {
                from: format!("{} with {:?}", self.state, pending.kind()),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.pending = pending;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Return to the role's settled state, clearing any pointer
    pub fn settle(&mut self) -> Result<()> {
        self.transition(self.role.settled_state(), Pending::None)
    }

    /// Administrative block; only [`User::unblock`] leaves it
    pub fn block(&mut self) {
        self.role = Role::Blocked;
        self.is_examiner = false;
        self.state = State::Blocked;
        self.pending = Pending::None;
        self.updated_at = Utc::now();
    }

    /// Administrative unblock, restoring an employee
    pub fn unblock(&mut self) {
        if !self.is_blocked() {
            return;
        }
        self.role = Role::Employee;
        self.state = if self.full_name.is_none() {
            State::AwaitingFullNameInput
        } else if self.position.is_none() {
            State::AwaitingPositionInput
        } else {
            Role::Employee.settled_state()
        };
        self.pending = Pending::None;
        self.updated_at = Utc::now();
    }

    /// Change role and land in the new role's settled state if currently settled
    pub fn set_role(&mut self, role: Role) -> Result<()> {
        if self.is_blocked() {
            return Err(ReportBuddyError::InvalidStateTransition {
                from: self.state.to_string(),
                to: format!("role {:?}", role),
            });
        }
        self.role = role;
        if self.state.is_settled() {
            self.settle()?;
        }
        Ok(())
    }

    pub fn current_report(&self) -> Option<&str> {
        match &self.pending {
            Pending::Draft { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn reviewing_report(&self) -> Option<&ReviewPointer> {
        match &self.pending {
            Pending::Reviewing(pointer) => Some(pointer),
            _ => None,
        }
    }

    pub fn answer_for(&self) -> Option<&AnswerPointer> {
        match &self.pending {
            Pending::Answering(pointer) => Some(pointer),
            _ => None,
        }
    }

    pub fn selected_user_id(&self) -> Option<i64> {
        match self.pending {
            Pending::SelectedUser { user_id } => Some(user_id),
            _ => None,
        }
    }

    pub fn selected_working_chat_id(&self) -> Option<i64> {
        match self.pending {
            Pending::SelectedWorkingChat { chat_id } => Some(chat_id),
            _ => None,
        }
    }
}
