//! Working chat repository implementation

use sqlx::{PgConnection, PgPool};

use crate::models::WorkingChat;
use crate::utils::errors::Result;

#[derive(Clone)]
#[derive(Debug)]
pub struct WorkingChatRepository {
    pool: PgPool,
}

impl WorkingChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, chat_id: i64) -> Result<Option<WorkingChat>> {
        let chat = sqlx::query_as::<_, WorkingChat>(
            "SELECT chat_id, title, registered_by, created_at FROM working_chats WHERE chat_id = $1"
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    pub async fn list(&self) -> Result<Vec<WorkingChat>> {
        let chats = sqlx::query_as::<_, WorkingChat>(
            "SELECT chat_id, title, registered_by, created_at \
             FROM working_chats ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }

    pub async fn upsert(conn: &mut PgConnection, chat: &WorkingChat) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO working_chats (chat_id, title, registered_by, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (chat_id) DO UPDATE SET title = EXCLUDED.title
            "#
        )
        .bind(chat.chat_id)
        .bind(&chat.title)
        .bind(chat.registered_by)
        .bind(chat.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, chat_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM working_chats WHERE chat_id = $1")
            .bind(chat_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
