//! Event router: interprets inbound push-events and decides persistence and
//! fan-out.
//!
//! Typing indicators are relayed without touching storage. File sends are
//! persisted through the conversation store before any fan-out; persistence
//! failures are logged and nothing is forwarded. Seen-marks update the store
//! and notify the original sender.

use std::sync::Arc;

use tracing::{error, warn};

use palaver_database::{canonical_pair_key, MessagePayload, NewChatMessage};

use crate::rest::message::MessageResponse;
use crate::state::GatewayState;
use crate::websocket::events::{ClientEvent, ServerEvent};

/// Dispatch one client event for an authenticated connection.
pub async fn handle_client_event(
    event: ClientEvent,
    state: &Arc<GatewayState>,
    user: &palaver_auth::User,
) {
    match event {
        ClientEvent::Typing { receiver_id } => {
            state
                .hub()
                .deliver(
                    &receiver_id,
                    ServerEvent::Typing {
                        sender_id: user.public_id.clone(),
                    },
                )
                .await;
        }
        ClientEvent::StopTyping { receiver_id } => {
            state
                .hub()
                .deliver(
                    &receiver_id,
                    ServerEvent::StopTyping {
                        sender_id: user.public_id.clone(),
                    },
                )
                .await;
        }
        ClientEvent::SendFile {
            receiver_id,
            file_data,
            file_name,
            file_type,
        } => {
            handle_send_file(state, user, receiver_id, file_data, file_name, file_type).await;
        }
        ClientEvent::MarkAsSeen { sender_id } => {
            handle_mark_as_seen(state, user, sender_id).await;
        }
    }
}

async fn handle_send_file(
    state: &Arc<GatewayState>,
    user: &palaver_auth::User,
    receiver_id: String,
    file_data: String,
    file_name: String,
    file_type: String,
) {
    if receiver_id.trim().is_empty()
        || file_data.is_empty()
        || file_name.trim().is_empty()
        || file_type.trim().is_empty()
    {
        warn!(user = %user.public_id, "dropping sendFile with missing fields");
        state
            .hub()
            .deliver(
                &user.public_id,
                ServerEvent::Error {
                    message: "sendFile requires receiverId, fileData, fileName and fileType"
                        .to_string(),
                },
            )
            .await;
        return;
    }

    let pair_key = canonical_pair_key(&user.public_id, &receiver_id);
    let stored = match state
        .chat_sessions()
        .append_message(
            &pair_key,
            NewChatMessage {
                sender_id: user.public_id.clone(),
                receiver_id: receiver_id.clone(),
                payload: MessagePayload::file(file_name, file_type, file_data),
            },
        )
        .await
    {
        Ok(stored) => stored,
        Err(err) => {
            error!(user = %user.public_id, error = %err, "failed to persist file message");
            return;
        }
    };

    let message = MessageResponse::from(stored);

    // Receiver and sender echo, so the sender's own UI reflects the file.
    state
        .hub()
        .deliver(
            &receiver_id,
            ServerEvent::ReceiveFile {
                message: message.clone(),
            },
        )
        .await;
    state
        .hub()
        .deliver(&user.public_id, ServerEvent::ReceiveFile { message })
        .await;

    state
        .hub()
        .deliver(
            &receiver_id,
            ServerEvent::NewNotification {
                sender_id: user.public_id.clone(),
                sender_username: user.username.clone(),
                message: "Sent you a file".to_string(),
                kind: "file".to_string(),
            },
        )
        .await;
}

async fn handle_mark_as_seen(state: &Arc<GatewayState>, user: &palaver_auth::User, sender_id: String) {
    let pair_key = canonical_pair_key(&sender_id, &user.public_id);

    match state.chat_sessions().mark_seen(&pair_key, &sender_id).await {
        Ok(true) => {
            state
                .hub()
                .deliver(
                    &sender_id,
                    ServerEvent::MessageSeen {
                        sender_id: sender_id.clone(),
                        receiver_id: user.public_id.clone(),
                    },
                )
                .await;
        }
        Ok(false) => {}
        Err(err) => {
            error!(user = %user.public_id, error = %err, "failed to mark messages seen");
        }
    }
}
