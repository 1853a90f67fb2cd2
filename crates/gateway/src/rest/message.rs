//! Message REST endpoints: the request/response write path and history reads.
//!
//! Writes go through the same conversation store and pair canonicalization as
//! the push-event path, so history is consistent regardless of which path
//! produced it. New messages are delivered to exactly the two conversation
//! participants over the hub.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use palaver_database::{canonical_pair_key, MessagePayload, NewChatMessage, StoredMessage};

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;
use crate::websocket::events::ServerEvent;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    pub is_file: bool,
    pub seen: bool,
    pub timestamp: String,
}

impl From<StoredMessage> for MessageResponse {
    fn from(message: StoredMessage) -> Self {
        let (content, file_name, file_type, file_data, is_file) = match message.payload {
            MessagePayload::Text { content } => (Some(content), None, None, None, false),
            MessagePayload::File {
                file_name,
                file_type,
                file_data,
            } => (None, Some(file_name), Some(file_type), Some(file_data), true),
        };

        Self {
            id: message.public_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content,
            file_name,
            file_type,
            file_data,
            is_file,
            seen: message.seen,
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub receiver_username: String,
    pub content: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    pub username: String,
}

/// Create message routes
pub fn create_message_routes() -> Router<Arc<GatewayState>> {
    Router::new().route(
        "/messages",
        axum::routing::get(fetch_history).post(create_message),
    )
}

#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message persisted", body = MessageResponse),
        (status = 400, description = "Empty message content"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Receiver not found")
    )
)]
pub async fn create_message(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateMessageRequest>,
) -> GatewayResult<impl IntoResponse> {
    if payload.content.trim().is_empty() {
        return Err(GatewayError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }

    let receiver = state
        .users()
        .find_by_username(&payload.receiver_username)
        .await?
        .ok_or_else(|| GatewayError::NotFound("Receiver not found".to_string()))?;

    let pair_key = canonical_pair_key(&user.public_id, &receiver.public_id);
    let stored = state
        .chat_sessions()
        .append_message(
            &pair_key,
            NewChatMessage {
                sender_id: user.public_id.clone(),
                receiver_id: receiver.public_id.clone(),
                payload: MessagePayload::text(payload.content.clone()),
            },
        )
        .await?;

    let message = MessageResponse::from(stored);

    // Scoped delivery to the two participants only.
    let event = ServerEvent::NewMessage {
        message: message.clone(),
    };
    state.hub().deliver(&receiver.public_id, event.clone()).await;
    state.hub().deliver(&user.public_id, event).await;

    state
        .hub()
        .deliver(
            &receiver.public_id,
            ServerEvent::NewNotification {
                sender_id: user.public_id.clone(),
                sender_username: user.username.clone(),
                message: payload.content,
                kind: "message".to_string(),
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Messages",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Full conversation history, oldest first", body = Vec<MessageResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Counterpart not found")
    )
)]
pub async fn fetch_history(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<HistoryQuery>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let counterpart = state
        .users()
        .find_by_username(&query.username)
        .await?
        .ok_or_else(|| GatewayError::NotFound("User not found".to_string()))?;

    let pair_key = canonical_pair_key(&user.public_id, &counterpart.public_id);
    let messages = state.chat_sessions().list_messages(&pair_key).await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}
