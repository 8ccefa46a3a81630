//! Database service layer
//!
//! Postgres-backed [`Store`]: repositories for reads, one transaction per save.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, error};

use crate::database::store::{Entity, Mutation, Store};
use crate::database::{DatabasePool, ReportRepository, UserRepository, WorkingChatRepository};
use crate::models::{Report, User, WorkingChat};
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub reports: ReportRepository,
    pub working_chats: WorkingChatRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            reports: ReportRepository::new(pool.clone()),
            working_chats: WorkingChatRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl Store for DatabaseService {
    async fn load_user(&self, id: i64) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn load_report(&self, user_id: i64, date: NaiveDate) -> Result<Option<Report>> {
        self.reports.find(user_id, date).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list().await
    }

    async fn load_working_chat(&self, chat_id: i64) -> Result<Option<WorkingChat>> {
        self.working_chats.find(chat_id).await
    }

    async fn list_working_chats(&self) -> Result<Vec<WorkingChat>> {
        self.working_chats.list().await
    }

    async fn save(&self, mutations: Vec<Mutation>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for mutation in &mutations {
            let applied = match mutation {
                Mutation::User(user) => UserRepository::upsert(&mut tx, user).await,
                Mutation::Report(report) => ReportRepository::upsert(&mut tx, report).await,
                Mutation::WorkingChat(chat) => WorkingChatRepository::upsert(&mut tx, chat).await,
                Mutation::Delete(Entity::Report { user_id, date }) => {
                    ReportRepository::delete(&mut tx, *user_id, *date).await
                }
                Mutation::Delete(Entity::WorkingChat { chat_id }) => {
                    WorkingChatRepository::delete(&mut tx, *chat_id).await
                }
            };

            if let Err(e) = applied {
                error!(error = %e, "Save failed, rolling back");
                tx.rollback().await?;
                return Err(e);
            }
        }

        tx.commit().await?;
        debug!(mutations = mutations.len(), "Save committed");
        Ok(())
    }
}
