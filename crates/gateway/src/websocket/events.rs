//! Wire protocol for the chat WebSocket.
//!
//! Frames are JSON objects tagged with an `event` field; event and field
//! names are camelCase. Payload validation happens at this boundary: a frame
//! that does not match a variant fails to deserialize and never reaches the
//! router.

use serde::{Deserialize, Serialize};

use crate::rest::message::MessageResponse;

/// Events received from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// The sender started typing to a peer
    #[serde(rename_all = "camelCase")]
    Typing { receiver_id: String },
    /// The sender stopped typing
    #[serde(rename_all = "camelCase")]
    StopTyping { receiver_id: String },
    /// Send a file to a peer
    #[serde(rename_all = "camelCase")]
    SendFile {
        receiver_id: String,
        file_data: String,
        file_name: String,
        file_type: String,
    },
    /// Mark every message authored by `sender_id` as seen by the caller
    #[serde(rename_all = "camelCase")]
    MarkAsSeen { sender_id: String },
}

/// Events pushed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full online set, unicast right after a successful connect
    #[serde(rename_all = "camelCase")]
    OnlineUsers { users: Vec<String> },
    /// An identity came online (broadcast)
    #[serde(rename_all = "camelCase")]
    UserOnline { user_id: String },
    /// An identity went offline (broadcast)
    #[serde(rename_all = "camelCase")]
    UserOffline { user_id: String },
    /// A new text message, delivered to both conversation participants
    #[serde(rename_all = "camelCase")]
    NewMessage { message: MessageResponse },
    /// A file message, delivered to the receiver and echoed to the sender
    #[serde(rename_all = "camelCase")]
    ReceiveFile { message: MessageResponse },
    /// `receiver_id` has seen every message authored by `sender_id`
    #[serde(rename_all = "camelCase")]
    MessageSeen {
        sender_id: String,
        receiver_id: String,
    },
    /// Out-of-band notification about an incoming message or file
    #[serde(rename_all = "camelCase")]
    NewNotification {
        sender_id: String,
        sender_username: String,
        message: String,
        #[serde(rename = "type")]
        kind: String,
    },
    /// A peer is typing to the recipient
    #[serde(rename_all = "camelCase")]
    Typing { sender_id: String },
    /// A peer stopped typing
    #[serde(rename_all = "camelCase")]
    StopTyping { sender_id: String },
    /// A rejected or failed client event
    Error { message: String },
}
