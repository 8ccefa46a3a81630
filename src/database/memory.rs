//! In-process store
//!
//! Backs tests and `database.url = "memory://"` deployments. Saves are applied
//! under one write lock, which gives the same all-or-nothing behaviour as a
//! database transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::store::{Entity, Mutation, Store};
use crate::models::{Report, User, WorkingChat};
use crate::utils::errors::{ReportBuddyError, Result};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    reports: HashMap<(i64, NaiveDate), Report>,
    working_chats: BTreeMap<i64, WorkingChat>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    saves: AtomicU64,
    fail_next_save: AtomicBool,
    fail_next_load_of: Mutex<Option<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save` fail without applying anything
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Make the next `load_user` of `user_id` fail
    pub fn fail_next_load_of(&self, user_id: i64) {
        if let Ok(mut target) = self.fail_next_load_of.lock() {
            *target = Some(user_id);
        }
    }

    fn injected(what: &str) -> ReportBuddyError {
        ReportBuddyError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("injected {} failure", what),
        ))
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// All reports of a user, oldest first
    pub async fn reports_of(&self, user_id: i64) -> Vec<Report> {
        let tables = self.tables.read().await;
        let mut reports: Vec<Report> = tables
            .reports
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.date);
        reports
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_user(&self, id: i64) -> Result<Option<User>> {
        if let Ok(mut target) = self.fail_next_load_of.lock() {
            if *target == Some(id) {
                *target = None;
                return Err(Self::injected("load"));
            }
        }
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn load_report(&self, user_id: i64, date: NaiveDate) -> Result<Option<Report>> {
        Ok(self.tables.read().await.reports.get(&(user_id, date)).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn load_working_chat(&self, chat_id: i64) -> Result<Option<WorkingChat>> {
        Ok(self.tables.read().await.working_chats.get(&chat_id).cloned())
    }

    async fn list_working_chats(&self) -> Result<Vec<WorkingChat>> {
        Ok(self.tables.read().await.working_chats.values().cloned().collect())
    }

    async fn save(&self, mutations: Vec<Mutation>) -> Result<()> {
        let mut tables = self.tables.write().await;

        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(Self::injected("save"));
        }

        debug!(mutations = mutations.len(), "Applying save");
        for mutation in mutations {
            match mutation {
                Mutation::User(user) => {
                    tables.users.insert(user.id, user);
                }
                Mutation::Report(report) => {
                    tables.reports.insert((report.user_id, report.date), report);
                }
                Mutation::WorkingChat(chat) => {
                    tables.working_chats.insert(chat.chat_id, chat);
                }
                Mutation::Delete(Entity::Report { user_id, date }) => {
                    tables.reports.remove(&(user_id, date));
                }
                Mutation::Delete(Entity::WorkingChat { chat_id }) => {
                    tables.working_chats.remove(&chat_id);
                }
            }
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    #[tokio::test]
    async fn test_failed_save_applies_nothing() {
        let store = MemoryStore::new();
        let user = User::new(1, 1, None, Role::Employee, Utc::now());
        let report = Report::new(1, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

        store.fail_next_save();
        let result = store
            .save(vec![Mutation::User(user.clone()), Mutation::Report(report.clone())])
            .await;
        assert!(result.is_err());
        assert!(store.load_user(1).await.unwrap().is_none());

        store.save(vec![Mutation::User(user), Mutation::Report(report)]).await.unwrap();
        assert!(store.load_user(1).await.unwrap().is_some());
        assert_eq!(store.reports_of(1).await.len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_report() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        store.save(vec![Mutation::Report(Report::new(1, date))]).await.unwrap();
        store.delete(Entity::Report { user_id: 1, date }).await.unwrap();
        assert!(store.load_report(1, date).await.unwrap().is_none());
    }
}
