//! SQLite implementation of [`ChatStore`].
//!
//! Uses `sqlx` with runtime-verified queries so no `DATABASE_URL` is needed
//! at compile time. The schema is applied on connect with
//! `CREATE TABLE IF NOT EXISTS`, making `relayd init` idempotent.
//!
//! Messages reference their chat with `ON DELETE CASCADE`; the
//! `foreign_keys` pragma is enabled on every connection so the cascade is
//! enforced by SQLite itself rather than by application code.

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::warn;

use crate::models::{Chat, Message, Role};

use super::{ChatStore, StoreStats};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chats (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    user_id    TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY,
    chat_id    TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role       TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
    content    TEXT NOT NULL,
    model      TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at);
";

/// SQLite-backed chat store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// An in-memory database, used by tests. Pool size is pinned to one
    /// connection because each SQLite `:memory:` connection is its own
    /// database.
    pub async fn connect_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn parse_role(raw: &str) -> Role {
    Role::parse(raw).unwrap_or_else(|| {
        warn!(raw, "unexpected role in messages table; treating as user");
        Role::User
    })
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e| {
        warn!(raw, error = %e, "failed to parse stored timestamp; using now");
        Utc::now()
    })
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn create_chat(&self, chat: &Chat) -> Result<()> {
        sqlx::query("INSERT INTO chats (id, name, created_at, user_id) VALUES (?1, ?2, ?3, ?4)")
            .bind(&chat.id)
            .bind(&chat.name)
            .bind(chat.created_at.to_rfc3339())
            .bind(&chat.user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        let row: Option<(String, String, String, Option<String>)> =
            sqlx::query_as("SELECT id, name, created_at, user_id FROM chats WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, name, created_at, user_id)| Chat {
            id,
            name,
            created_at: parse_ts(&created_at),
            user_id,
        }))
    }

    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, name, created_at, user_id FROM chats \
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, created_at, user_id)| Chat {
                id,
                name,
                created_at: parse_ts(&created_at),
                user_id,
            })
            .collect())
    }

    async fn delete_chat(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, role, content, model, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.model)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let rows: Vec<(String, String, String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, chat_id, role, content, model, created_at FROM messages \
             WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, chat_id, role, content, model, created_at)| Message {
                id,
                chat_id,
                role: parse_role(&role),
                content,
                model,
                created_at: parse_ts(&created_at),
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM chats").execute(&self.pool).await?;
        sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (chats,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await?;
        let (messages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreStats {
            chats: chats as u64,
            messages: messages as u64,
        })
    }
}
