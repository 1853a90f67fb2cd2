//! Palaver Database Crate
//!
//! This crate provides database functionality for the Palaver messaging
//! backend: connection management, migrations, entities, and the repository
//! implementations for the user directory and the per-pair conversation
//! store.

use sqlx::SqlitePool;
use palaver_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{canonical_pair_key, ChatSessionRepository, UserRepository};

pub use entities::{
    message::{ChatSession, MessagePayload, NewChatMessage, StoredMessage},
    user::User,
};

pub use types::{
    errors::{ChatError, DatabaseError, UserError},
    ChatResult, DatabaseResult, UserResult,
};

/// Initialize the database: connect and apply migrations.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    Ok(pool)
}
