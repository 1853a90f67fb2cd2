//! Repository for the per-pair conversation store.
//!
//! A conversation is addressed by its canonical pair key, produced by
//! [`canonical_pair_key`]. Appends to the same pair are serialized through a
//! per-key async mutex so that concurrent writers (the REST path and the
//! push-event path) never interleave a load-or-create with another append.

use crate::entities::{ChatSession, MessagePayload, NewChatMessage, StoredMessage};
use crate::types::{ChatError, ChatResult};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Canonical, order-independent key for the conversation between two
/// identities: the sorted pair joined with `:`.
///
/// Every write path must address conversations through this function, or two
/// logs for the same human pair will silently fork.
pub fn canonical_pair_key(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

/// Repository for conversation logs
#[derive(Clone)]
pub struct ChatSessionRepository {
    pool: SqlitePool,
    write_locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ChatSessionRepository {
    /// Create a new conversation repository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Append a message to the conversation identified by `pair_key`,
    /// creating the session lazily on first contact.
    pub async fn append_message(
        &self,
        pair_key: &str,
        message: NewChatMessage,
    ) -> ChatResult<StoredMessage> {
        if canonical_pair_key(&message.sender_id, &message.receiver_id) != pair_key {
            return Err(ChatError::validation(
                "pair key does not match message participants",
            ));
        }

        let lock = self.lock_for(pair_key);
        let _guard = lock.lock().await;

        let session_id = self.ensure_session(pair_key).await?;

        let public_id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        let (content, file_name, file_type, file_data, is_file) = match &message.payload {
            MessagePayload::Text { content } => {
                (Some(content.as_str()), None, None, None, false)
            }
            MessagePayload::File {
                file_name,
                file_type,
                file_data,
            } => (
                None,
                Some(file_name.as_str()),
                Some(file_type.as_str()),
                Some(file_data.as_str()),
                true,
            ),
        };

        let result = sqlx::query(
            "INSERT INTO messages
                 (public_id, session_id, sender_id, receiver_id, content,
                  file_name, file_type, file_data, is_file, seen, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&public_id)
        .bind(session_id)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(content)
        .bind(file_name)
        .bind(file_type)
        .bind(file_data)
        .bind(is_file)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        info!(
            message_id = result.last_insert_rowid(),
            public_id = %public_id,
            pair_key = %pair_key,
            is_file,
            "appended message"
        );

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            public_id,
            session_id,
            sender_id: message.sender_id,
            receiver_id: Some(message.receiver_id),
            payload: message.payload,
            seen: false,
            created_at,
        })
    }

    /// Mark every unseen message authored by `from_identity` in the
    /// conversation as seen. Returns false (and does nothing) when the
    /// conversation does not exist.
    pub async fn mark_seen(&self, pair_key: &str, from_identity: &str) -> ChatResult<bool> {
        let Some(session) = self.find_session(pair_key).await? else {
            return Ok(false);
        };

        let result = sqlx::query(
            "UPDATE messages SET seen = 1 WHERE session_id = ? AND sender_id = ? AND seen = 0",
        )
        .bind(session.id)
        .bind(from_identity)
        .execute(&self.pool)
        .await?;

        info!(
            pair_key = %pair_key,
            sender = %from_identity,
            marked = result.rows_affected(),
            "marked messages seen"
        );

        Ok(true)
    }

    /// The full ordered message log for a conversation; empty when the two
    /// identities have never talked. Never an error for "no conversation yet".
    pub async fn list_messages(&self, pair_key: &str) -> ChatResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT m.id, m.public_id, m.session_id, m.sender_id, m.receiver_id,
                    m.content, m.file_name, m.file_type, m.file_data, m.is_file,
                    m.seen, m.created_at
             FROM messages m
             JOIN chat_sessions s ON s.id = m.session_id
             WHERE s.pair_key = ?
             ORDER BY m.id ASC",
        )
        .bind(pair_key)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_message).collect()
    }

    /// Look up the session row for a pair key, if any
    pub async fn find_session(&self, pair_key: &str) -> ChatResult<Option<ChatSession>> {
        let row = sqlx::query(
            "SELECT id, pair_key, user_a, user_b, created_at FROM chat_sessions WHERE pair_key = ?",
        )
        .bind(pair_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(ChatSession {
                id: row.try_get("id")?,
                pair_key: row.try_get("pair_key")?,
                user_a: row.try_get("user_a")?,
                user_b: row.try_get("user_b")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    /// Load or lazily create the session row for a pair key.
    ///
    /// The upsert means a uniqueness race between two first-contact writers
    /// degrades to both using the surviving row rather than surfacing a
    /// conflict.
    async fn ensure_session(&self, pair_key: &str) -> ChatResult<i64> {
        let (user_a, user_b) = pair_key
            .split_once(':')
            .ok_or_else(|| ChatError::validation("malformed pair key"))?;
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO chat_sessions (pair_key, user_a, user_b, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(pair_key) DO NOTHING",
        )
        .bind(pair_key)
        .bind(user_a)
        .bind(user_b)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM chat_sessions WHERE pair_key = ?")
            .bind(pair_key)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    fn lock_for(&self, pair_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().expect("pair lock map poisoned");
        locks
            .entry(pair_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn map_message(row: sqlx::sqlite::SqliteRow) -> ChatResult<StoredMessage> {
    let is_file: bool = row.try_get("is_file")?;

    let payload = if is_file {
        let file_name: Option<String> = row.try_get("file_name")?;
        let file_type: Option<String> = row.try_get("file_type")?;
        let file_data: Option<String> = row.try_get("file_data")?;
        match (file_name, file_type, file_data) {
            (Some(file_name), Some(file_type), Some(file_data)) => MessagePayload::File {
                file_name,
                file_type,
                file_data,
            },
            _ => return Err(ChatError::validation("file message is missing file fields")),
        }
    } else {
        let content: Option<String> = row.try_get("content")?;
        MessagePayload::Text {
            content: content
                .ok_or_else(|| ChatError::validation("text message is missing content"))?,
        }
    };

    Ok(StoredMessage {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        session_id: row.try_get("session_id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        payload,
        seen: row.try_get("seen")?,
        created_at: row.try_get("created_at")?,
    })
}
