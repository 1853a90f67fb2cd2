//! Shared application state for the gateway

use std::sync::Arc;

use palaver_auth::Authenticator;
use palaver_database::{ChatSessionRepository, UserRepository};
use sqlx::SqlitePool;

use crate::hub::ConnectionHub;

/// Shared application state: repositories, the identity verifier, and the
/// connection hub.
#[derive(Clone)]
pub struct GatewayState {
    pool: SqlitePool,
    authenticator: Authenticator,
    users: UserRepository,
    chat_sessions: ChatSessionRepository,
    hub: Arc<ConnectionHub>,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator) -> Self {
        let users = UserRepository::new(pool.clone());
        let chat_sessions = ChatSessionRepository::new(pool.clone());

        Self {
            pool,
            authenticator,
            users,
            chat_sessions,
            hub: Arc::new(ConnectionHub::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn chat_sessions(&self) -> &ChatSessionRepository {
        &self.chat_sessions
    }

    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }
}
