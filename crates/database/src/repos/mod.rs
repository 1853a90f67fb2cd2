//! Repository implementations for database access.

pub mod chat_session_repository;
pub mod user_repository;

pub use chat_session_repository::{canonical_pair_key, ChatSessionRepository};
pub use user_repository::UserRepository;
