//! REST end-to-end tests driven through the router with in-process requests.

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use palaver_backend_runtime::BackendServices;
use palaver_config::AppConfig;
use palaver_gateway::{create_router, GatewayState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    pool: SqlitePool,
    _db_dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("palaver-test.db");

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", db_path.to_string_lossy());
        config.database.max_connections = 5;

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");

        let state = GatewayState::new(services.db_pool.clone(), services.authenticator.clone());
        let router = create_router(state);

        Self {
            router,
            pool: services.db_pool.clone(),
            _db_dir: db_dir,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let app = self.router.clone();
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = app
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap_or_default();
        let json = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        TestResponse { status, json }
    }

    async fn register(&self, username: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "password123",
                "confirmPassword": "password123"
            })),
            None,
        )
        .await
    }

    /// Register (ignoring "already exists") and log in, returning the token.
    async fn login(&self, username: &str) -> String {
        self.register(username).await;

        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(json!({"username": username, "password": "password123"})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login should succeed");

        response
            .json
            .get("token")
            .and_then(Value::as_str)
            .expect("login response should carry a token")
            .to_string()
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json.get("status").and_then(Value::as_str),
        Some("ok")
    );
    assert!(
        response
            .json
            .get("timestamp")
            .and_then(Value::as_str)
            .is_some(),
        "health response should include timestamp"
    );
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;

    let cases = [
        json!({"username": "ab", "email": "a@b.com", "password": "password123", "confirmPassword": "password123"}),
        json!({"username": "has space", "email": "a@b.com", "password": "password123", "confirmPassword": "password123"}),
        json!({"username": "alice1", "email": "not-an-email", "password": "password123", "confirmPassword": "password123"}),
        json!({"username": "alice1", "email": "a@b.com", "password": "short", "confirmPassword": "short"}),
        json!({"username": "alice1", "email": "a@b.com", "password": "password123", "confirmPassword": "different456"}),
    ];

    for body in cases {
        let response = app
            .request(Method::POST, "/api/auth/register", Some(body.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "case: {body}");
    }
}

#[tokio::test]
async fn register_conflicts_on_duplicate_accounts() {
    let app = TestApp::new().await;

    let first = app.register("alice").await;
    assert_eq!(first.status, StatusCode::CREATED);

    let duplicate = app.register("alice").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_round_trip_and_me() {
    let app = TestApp::new().await;
    let token = app.login("alice").await;

    let me = app
        .request(Method::GET, "/api/auth/me", None, Some(&token))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(
        me.json.get("username").and_then(Value::as_str),
        Some("alice")
    );

    let wrong = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "alice", "password": "wrong-password"})),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/users", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let invalid = app
        .request(Method::GET, "/api/users", None, Some("not-a-token"))
        .await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_the_session_token() {
    let app = TestApp::new().await;
    let token = app.login("alice").await;

    let refreshed = app
        .request(Method::POST, "/api/auth/refresh", None, Some(&token))
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let new_token = refreshed
        .json
        .get("token")
        .and_then(Value::as_str)
        .expect("refresh should return a token")
        .to_string();
    assert_ne!(new_token, token);

    // The old token no longer works, the new one does.
    let old = app
        .request(Method::GET, "/api/auth/me", None, Some(&token))
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .request(Method::GET, "/api/auth/me", None, Some(&new_token))
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn user_directory_lists_and_searches() {
    let app = TestApp::new().await;
    let alice_token = app.login("alice").await;
    app.login("bobby").await;
    app.login("boris").await;

    let listed = app
        .request(Method::GET, "/api/users", None, Some(&alice_token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let names: Vec<&str> = listed
        .json
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.get("username").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(names, vec!["bobby", "boris"], "caller is excluded");

    let searched = app
        .request(
            Method::GET,
            "/api/users/search?q=bob",
            None,
            Some(&alice_token),
        )
        .await;
    assert_eq!(searched.status, StatusCode::OK);
    let hits = searched.json.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].get("username").and_then(Value::as_str),
        Some("bobby")
    );

    let blank = app
        .request(Method::GET, "/api/users/search?q=", None, Some(&alice_token))
        .await;
    assert_eq!(blank.status, StatusCode::OK);
    assert!(blank.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn history_is_empty_before_any_message() {
    let app = TestApp::new().await;
    let alice_token = app.login("alice").await;
    app.login("bobby").await;

    let history = app
        .request(
            Method::GET,
            "/api/messages?username=bobby",
            None,
            Some(&alice_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.json, json!([]));
}

#[tokio::test]
async fn message_round_trip_between_two_users() {
    let app = TestApp::new().await;
    let alice_token = app.login("alice").await;
    let bob_token = app.login("bobby").await;

    let sent = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({"receiverUsername": "bobby", "content": "hi"})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.json.get("content").and_then(Value::as_str), Some("hi"));
    assert_eq!(sent.json.get("seen").and_then(Value::as_bool), Some(false));
    let alice_id = sent
        .json
        .get("senderId")
        .and_then(Value::as_str)
        .expect("persisted message carries the sender id")
        .to_string();

    // Both directions see the same single-message history.
    for (token, counterpart) in [(&alice_token, "bobby"), (&bob_token, "alice")] {
        let history = app
            .request(
                Method::GET,
                &format!("/api/messages?username={counterpart}"),
                None,
                Some(token),
            )
            .await;
        assert_eq!(history.status, StatusCode::OK);
        let messages = history.json.as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].get("senderId").and_then(Value::as_str),
            Some(alice_id.as_str())
        );
        assert_eq!(
            messages[0].get("content").and_then(Value::as_str),
            Some("hi")
        );
    }

    // The reply lands in the same conversation, in send order.
    let reply = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({"receiverUsername": "alice", "content": "hey"})),
            Some(&bob_token),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let history = app
        .request(
            Method::GET,
            "/api/messages?username=bobby",
            None,
            Some(&alice_token),
        )
        .await;
    let messages = history.json.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0].get("content").and_then(Value::as_str),
        Some("hi")
    );
    assert_eq!(
        messages[1].get("content").and_then(Value::as_str),
        Some("hey")
    );

    // Exactly one session row exists for the pair.
    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions")
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(sessions, 1);
}

#[tokio::test]
async fn message_send_rejects_bad_input() {
    let app = TestApp::new().await;
    let alice_token = app.login("alice").await;

    let unknown = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({"receiverUsername": "nobody", "content": "hi"})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let empty = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({"receiverUsername": "alice", "content": "   "})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let unknown_history = app
        .request(
            Method::GET,
            "/api/messages?username=nobody",
            None,
            Some(&alice_token),
        )
        .await;
    assert_eq!(unknown_history.status, StatusCode::NOT_FOUND);
}
