//! Authentication REST endpoints

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl SessionResponse {
    fn new(session: palaver_auth::AuthSession, user: palaver_auth::User) -> Self {
        Self {
            token: session.token,
            user: user.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

impl From<palaver_auth::User> for UserResponse {
    fn from(user: palaver_auth::User) -> Self {
        Self {
            id: user.public_id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Routes that do not require an authenticated caller
pub fn create_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/auth/register", axum::routing::post(register))
        .route("/auth/login", axum::routing::post(login))
        .route("/auth/refresh", axum::routing::post(refresh))
}

/// Routes behind the authentication middleware
pub fn create_session_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/auth/me", axum::routing::get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Username or email taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<impl IntoResponse> {
    validate_registration(&payload)?;

    state
        .authenticator()
        .register_with_password(palaver_auth::NewAccount {
            username: payload.username,
            email: payload.email.to_lowercase(),
            password: payload.password,
            full_name: payload.full_name,
            phone: payload.phone,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful!".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(GatewayError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let session = state
        .authenticator()
        .login_with_password(&payload.username, &payload.password)
        .await?;
    let user = state.authenticator().user_profile(session.user_id).await?;

    Ok(Json(SessionResponse::new(session, user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Session rotated", body = SessionResponse),
        (status = 401, description = "No usable session token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> GatewayResult<Json<SessionResponse>> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayError::AuthenticationFailed("No token provided".to_string()))?;

    let session = state.authenticator().refresh_session(token).await?;
    let user = state.authenticator().user_profile(session.user_id).await?;

    Ok(Json(SessionResponse::new(session, user)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(user.into())
}

fn validate_registration(payload: &RegisterRequest) -> GatewayResult<()> {
    let username_ok = payload.username.len() >= 5
        && payload.username.len() <= 20
        && payload.username.chars().all(|c| c.is_ascii_alphanumeric());
    if !username_ok {
        return Err(GatewayError::Validation(
            "Username must be 5-20 characters, alphanumeric only.".to_string(),
        ));
    }

    if !EMAIL_RE.is_match(&payload.email) {
        return Err(GatewayError::Validation("Invalid email format.".to_string()));
    }

    if payload.password.len() < 8 {
        return Err(GatewayError::Validation(
            "Password must be at least 8 characters long.".to_string(),
        ));
    }

    if payload.password != payload.confirm_password {
        return Err(GatewayError::Validation(
            "Passwords do not match.".to_string(),
        ));
    }

    Ok(())
}
