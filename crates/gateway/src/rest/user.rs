//! User directory REST endpoints

use axum::{
    extract::{Query, State},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::GatewayResult;
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

const SEARCH_RESULT_LIMIT: i64 = 10;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl From<palaver_database::User> for UserSummaryResponse {
    fn from(user: palaver_database::User) -> Self {
        Self {
            id: user.public_id,
            username: user.username,
            full_name: user.full_name,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Create user directory routes
pub fn create_user_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/users", axum::routing::get(list_users))
        .route("/users/search", axum::routing::get(search_users))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Every user except the caller", body = Vec<UserSummaryResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> GatewayResult<Json<Vec<UserSummaryResponse>>> {
    let users = state.users().list_except(&user.public_id).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    tag = "Users",
    params(SearchQuery),
    responses(
        (status = 200, description = "Usernames matching the prefix", body = Vec<UserSummaryResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn search_users(
    State(state): State<Arc<GatewayState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> GatewayResult<Json<Vec<UserSummaryResponse>>> {
    let Some(prefix) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let users = state
        .users()
        .search_by_username_prefix(prefix, &user.public_id, SEARCH_RESULT_LIMIT)
        .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
