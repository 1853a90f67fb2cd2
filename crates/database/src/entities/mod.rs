//! Domain entities stored by the database layer.

pub mod message;
pub mod user;

pub use message::{ChatSession, MessagePayload, NewChatMessage, StoredMessage};
pub use user::User;
