//! User repository implementation

use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgConnection, PgPool};

use crate::models::{Role, User};
use crate::state::machine::{Pending, State};
use crate::utils::errors::{ReportBuddyError, Result};

const USER_COLUMNS: &str = "id, chat_id, username, full_name, position, role, is_examiner, \
     working_chat_id, state, pending, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    chat_id: i64,
    username: Option<String>,
    full_name: Option<String>,
    position: Option<String>,
    role: Role,
    is_examiner: bool,
    working_chat_id: Option<i64>,
    state: State,
    pending: Json<Pending>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ReportBuddyError;

    fn try_from(row: UserRow) -> Result<Self> {
        User::restore(
            row.id,
            row.chat_id,
            row.username,
            row.full_name,
            row.position,
            row.role,
            row.is_examiner,
            row.working_chat_id,
            row.state,
            row.pending.0,
            row.created_at,
            row.updated_at,
        )
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find user by Telegram ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// List all users
    pub async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Insert or fully overwrite a user, state and pointer included
    pub async fn upsert(conn: &mut PgConnection, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, chat_id, username, full_name, position, role, is_examiner,
                working_chat_id, state, pending, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE
            SET chat_id = EXCLUDED.chat_id,
                username = EXCLUDED.username,
                full_name = EXCLUDED.full_name,
                position = EXCLUDED.position,
                role = EXCLUDED.role,
                is_examiner = EXCLUDED.is_examiner,
                working_chat_id = EXCLUDED.working_chat_id,
                state = EXCLUDED.state,
                pending = EXCLUDED.pending,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(user.id)
        .bind(user.chat_id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.position)
        .bind(user.role)
        .bind(user.is_examiner)
        .bind(user.working_chat_id)
        .bind(user.state())
        .bind(Json(user.pending()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
