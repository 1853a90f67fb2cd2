//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Convert from domain error types
impl From<palaver_auth::AuthError> for GatewayError {
    fn from(error: palaver_auth::AuthError) -> Self {
        use palaver_auth::AuthError;
        match error {
            AuthError::UserExists => {
                GatewayError::Conflict("Username or email is already taken".to_string())
            }
            AuthError::InvalidCredentials => {
                GatewayError::AuthenticationFailed("Invalid username or password".to_string())
            }
            AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => {
                GatewayError::AuthenticationFailed("Invalid or expired token".to_string())
            }
            AuthError::Database(e) => GatewayError::DatabaseError(e.to_string()),
            AuthError::PasswordHash(e) => GatewayError::InternalError(e.to_string()),
        }
    }
}

impl From<palaver_database::ChatError> for GatewayError {
    fn from(error: palaver_database::ChatError) -> Self {
        use palaver_database::ChatError;
        match error {
            ChatError::Validation(msg) => GatewayError::Validation(msg),
            ChatError::Database(e) => GatewayError::DatabaseError(e.to_string()),
        }
    }
}

impl From<palaver_database::UserError> for GatewayError {
    fn from(error: palaver_database::UserError) -> Self {
        use palaver_database::UserError;
        match error {
            UserError::NotFound(id) => GatewayError::NotFound(format!("User not found: {id}")),
            UserError::Database(e) => GatewayError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::Validation(format!("JSON serialization error: {}", error))
    }
}
