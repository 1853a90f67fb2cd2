//! Chat WebSocket connection lifecycle.
//!
//! Authentication is a one-time gate at connection open: the credential
//! arrives as a `token` query parameter on the upgrade request and is
//! verified before the upgrade completes. The bound identity is immutable
//! for the connection's lifetime and is not re-verified per event; a revoked
//! session therefore stays usable until reconnect.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use crate::websocket::events::{ClientEvent, ServerEvent};
use crate::websocket::router;

/// An upgrade whose credential cannot be verified within this bound is
/// treated as an authentication failure.
const AUTH_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// Chat WebSocket connection handler
pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WebSocketQuery>,
) -> GatewayResult<Response> {
    let token = query.token.ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing authentication token".to_string())
    })?;

    let (user, _session) = tokio::time::timeout(
        AUTH_HANDSHAKE_TIMEOUT,
        state.authenticator().authenticate_token(&token),
    )
    .await
    .map_err(|_| GatewayError::AuthenticationFailed("Authentication timed out".to_string()))?
    .map_err(|e| GatewayError::AuthenticationFailed(format!("Invalid token: {e}")))?;

    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, user)))
}

/// Drive one authenticated connection until either side closes it.
async fn handle_chat_socket(socket: WebSocket, state: Arc<GatewayState>, user: palaver_auth::User) {
    let (mut sender, mut receiver) = socket.split();
    let user_id = user.public_id.clone();

    let (mut events_rx, came_online) = state.hub().connect(&user_id).await;
    info!(user = %user_id, came_online, "websocket connected");

    // The fresh connection gets the full online set, itself included.
    let snapshot = ServerEvent::OnlineUsers {
        users: state.hub().online_users(),
    };
    if let Ok(text) = serde_json::to_string(&snapshot) {
        let _ = sender.send(Message::Text(text)).await;
    }

    let recv_state = state.clone();
    let recv_user = user.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        router::handle_client_event(event, &recv_state, &recv_user).await;
                    }
                    Err(error) => {
                        warn!(user = %recv_user.public_id, %error, "dropping malformed client event");
                        recv_state
                            .hub()
                            .deliver(
                                &recv_user.public_id,
                                ServerEvent::Error {
                                    message: "malformed event payload".to_string(),
                                },
                            )
                            .await;
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            if let Ok(text) = serde_json::to_string(&event) {
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut receive_task => send_task.abort(),
        _ = &mut send_task => receive_task.abort(),
    }

    // Closing is idempotent at the hub; only the last connection flips
    // presence and announces the identity offline.
    let went_offline = state.hub().disconnect(&user_id).await;
    info!(user = %user_id, went_offline, "websocket disconnected");
}
