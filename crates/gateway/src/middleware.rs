//! Middleware for authentication and request logging

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// The verified identity of the caller, stored in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub palaver_auth::User);

/// Authentication middleware: resolves the bearer token (or, for WebSocket
/// upgrades, the `token` query parameter) to an identity and attaches it to
/// the request. Rejects the request outright when the credential is missing
/// or invalid.
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> GatewayResult<Response> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    let query_token = request.uri().query().and_then(token_from_query);

    let token = auth_header.or(query_token).ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing authentication token".to_string())
    })?;

    let (user, _session) = state
        .authenticator()
        .authenticate_token(&token)
        .await
        .map_err(|e| GatewayError::AuthenticationFailed(format!("Invalid token: {e}")))?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract a `token` parameter from a raw query string
pub fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) => urlencoding::decode(value)
                .ok()
                .map(|decoded| decoded.into_owned()),
            _ => None,
        }
    })
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(request: Request, next: Next) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_from_query_string() {
        assert_eq!(token_from_query("token=abc"), Some("abc".to_string()));
        assert_eq!(
            token_from_query("foo=bar&token=abc%2Fdef"),
            Some("abc/def".to_string())
        );
        assert_eq!(token_from_query("foo=bar"), None);
        assert_eq!(token_from_query(""), None);
    }
}
