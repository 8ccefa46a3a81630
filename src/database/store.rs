//! Store interface
//!
//! Handlers only see users, reports and working chats through [`Store`]. A
//! single [`Store::save`] call is applied atomically, so a state change and the
//! data it accompanies are persisted together or not at all.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Report, User, WorkingChat};
use crate::utils::errors::Result;

/// An entity addressed for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Report { user_id: i64, date: NaiveDate },
    WorkingChat { chat_id: i64 },
}

/// One write inside an atomic save
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    User(User),
    Report(Report),
    WorkingChat(WorkingChat),
    Delete(Entity),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_user(&self, id: i64) -> Result<Option<User>>;

    async fn load_report(&self, user_id: i64, date: NaiveDate) -> Result<Option<Report>>;

    /// Read-only listing, ordered by id; not taken under any user section
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn load_working_chat(&self, chat_id: i64) -> Result<Option<WorkingChat>>;

    async fn list_working_chats(&self) -> Result<Vec<WorkingChat>>;

    /// Apply all mutations atomically
    async fn save(&self, mutations: Vec<Mutation>) -> Result<()>;

    async fn delete(&self, entity: Entity) -> Result<()> {
        self.save(vec![Mutation::Delete(entity)]).await
    }
}
