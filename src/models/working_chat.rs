//! Working chat model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A group chat that receives review notifications for its assigned users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WorkingChat {
    pub chat_id: i64,
    pub title: Option<String>,
    pub registered_by: i64,
    pub created_at: DateTime<Utc>,
}
