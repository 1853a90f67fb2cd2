//! WebSocket endpoints for the gateway

pub mod connection;
pub mod events;
pub mod router;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws/chat", get(connection::chat_websocket_handler))
}
