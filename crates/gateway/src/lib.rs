//! # Palaver Gateway Crate
//!
//! This crate provides the API gateway for Palaver, handling HTTP REST and
//! WebSocket connections and routing them to the identity subsystem and the
//! conversation store.
//!
//! ## Architecture
//!
//! - **REST**: auth, user directory, and message endpoints with OpenAPI
//!   documentation
//! - **WebSocket**: the realtime connection lifecycle and event router
//! - **Hub/Presence**: per-identity delivery groups and the online registry
//! - **Middleware**: authentication and request logging

pub mod error;
pub mod hub;
pub mod middleware;
pub mod presence;
pub mod rest;
pub mod state;
pub mod websocket;

// Re-export main types for convenience
pub use error::{GatewayError, GatewayResult};
pub use hub::ConnectionHub;
pub use presence::PresenceRegistry;
pub use state::GatewayState;

use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .merge(rest::auth::create_session_routes())
        .merge(rest::user::create_user_routes())
        .merge(rest::message::create_message_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .merge(rest::auth::create_auth_routes())
        .merge(protected);

    let mut router = Router::new()
        .route("/health", get(rest::health::health))
        .nest("/api", api)
        .merge(websocket::create_websocket_routes());

    // Serve the OpenAPI document in debug builds.
    #[cfg(debug_assertions)]
    {
        use axum::Json;
        use utoipa::OpenApi;

        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::health,
                rest::auth::register,
                rest::auth::login,
                rest::auth::refresh,
                rest::auth::me,
                rest::user::list_users,
                rest::user::search_users,
                rest::message::create_message,
                rest::message::fetch_history,
            ),
            components(
                schemas(
                    rest::health::HealthResponse,
                    rest::auth::RegisterRequest,
                    rest::auth::RegisterResponse,
                    rest::auth::LoginRequest,
                    rest::auth::SessionResponse,
                    rest::auth::UserResponse,
                    rest::auth::ErrorResponse,
                    rest::user::UserSummaryResponse,
                    rest::message::MessageResponse,
                    rest::message::CreateMessageRequest,
                )
            ),
            tags(
                (name = "Health", description = "Service health"),
                (name = "Auth", description = "Authentication endpoints"),
                (name = "Users", description = "User directory"),
                (name = "Messages", description = "Conversation messages"),
            )
        )]
        struct ApiDoc;

        router = router.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .with_state(state)
}
