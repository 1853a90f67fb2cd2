use serde::{Deserialize, Serialize};

/// The conversation between exactly two identities.
///
/// One row exists per unordered participant pair; `user_a`/`user_b` hold the
/// participants in canonical order, matching the pair key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub pair_key: String,
    pub user_a: String,
    pub user_b: String,
    pub created_at: String,
}

/// What a message carries: either text or a named file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessagePayload {
    Text {
        content: String,
    },
    File {
        file_name: String,
        file_type: String,
        file_data: String,
    },
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn file(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_data: impl Into<String>,
    ) -> Self {
        Self::File {
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_data: file_data.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// A message to append to a conversation.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub payload: MessagePayload,
}

/// A persisted message.
///
/// Identity (sender, payload, timestamp) is immutable once appended; only the
/// `seen` flag changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub public_id: String,
    pub session_id: i64,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub payload: MessagePayload,
    pub seen: bool,
    pub created_at: String,
}
