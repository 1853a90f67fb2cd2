//! Repository for user directory lookups.
//!
//! Account creation and credential handling live in the auth crate; this
//! repository only answers "who is this" questions for the gateway: lookups
//! by name or public id, the full username listing, and prefix search.

use crate::entities::User;
use crate::types::{UserError, UserResult};
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str =
    "id, public_id, username, email, full_name, phone, created_at, updated_at";

/// Repository for user directory reads
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    /// Find a user by public id
    pub async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    /// List every user except the caller
    pub async fn list_except(&self, caller_public_id: &str) -> UserResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id != ? ORDER BY username ASC"
        ))
        .bind(caller_public_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_user).collect()
    }

    /// Prefix search on username, excluding the caller. LIKE is
    /// case-insensitive for ASCII in SQLite.
    pub async fn search_by_username_prefix(
        &self,
        prefix: &str,
        caller_public_id: &str,
        limit: i64,
    ) -> UserResult<Vec<User>> {
        let pattern = format!("{}%", escape_like(prefix));

        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username LIKE ? ESCAPE '\\' AND public_id != ?
             ORDER BY username ASC LIMIT ?"
        ))
        .bind(pattern)
        .bind(caller_public_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_user).collect()
    }
}

fn map_user(row: sqlx::sqlite::SqliteRow) -> UserResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
