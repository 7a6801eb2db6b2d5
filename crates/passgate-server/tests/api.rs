//! End-to-end tests for the demo server.

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use passgate_core::session::{Claims, SessionStore, Verification};
use passgate_server::{create_router, AppState, ServerConfig};
use serde_json::Value;

fn config() -> ServerConfig {
    ServerConfig {
        secret: "integration-secret".to_string(),
        issuer: Some("passgate-test".to_string()),
        users: vec!["alice:wonderland".to_string(), "bob:builder".to_string()],
        ..Default::default()
    }
}

fn server() -> (TestServer, AppState) {
    let state = AppState::new(config()).unwrap();
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

fn basic(credentials: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(credentials))).unwrap()
}

fn cookie_header(pair: &str) -> HeaderValue {
    HeaderValue::from_str(pair).unwrap()
}

/// The `name=value` pair of the first `Set-Cookie` header.
fn set_cookie_pair(response: &TestResponse) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();
    value.split(';').next().unwrap().to_string()
}

async fn log_in(server: &TestServer, credentials: &str) -> String {
    let response = server
        .post("/login")
        .add_header(header::AUTHORIZATION, basic(credentials))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    set_cookie_pair(&response)
}

#[tokio::test]
async fn test_health() {
    let (server, _) = server();
    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_login_without_credentials_is_challenged() {
    let (server, _) = server();
    let response = server.post("/login").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"passgate\""
    );
    assert_eq!(response.text(), "Unauthorized");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (server, state) = server();
    let response = server
        .post("/login")
        .add_header(header::AUTHORIZATION, basic("alice:guess"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.store.token_count(), 0);
}

#[tokio::test]
async fn test_login_issues_session() {
    let (server, state) = server();
    let response = server
        .post("/login")
        .add_header(header::AUTHORIZATION, basic("alice:wonderland"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["message"], "Welcome back, alice");

    let pair = set_cookie_pair(&response);
    let token = pair.strip_prefix("__session=").unwrap();
    let sessions = state.authenticator.sessions().unwrap();
    match sessions.codec().verify(token) {
        Verification::Valid(claims) => {
            assert_eq!(claims.sub, body["user"]["id"].as_str().unwrap());
            assert_eq!(claims.iss.as_deref(), Some("passgate-test"));
            assert!(state.store.is_issued(&claims.jti));
        }
        other => panic!("expected a valid token, got {other:?}"),
    }
}

#[tokio::test]
async fn test_me_round_trip() {
    let (server, _) = server();
    let cookie = log_in(&server, "bob:builder").await;

    let response = server
        .get("/me")
        .add_header(header::COOKIE, cookie_header(&cookie))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["username"], "bob");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_me_without_session() {
    let (server, _) = server();
    let response = server.get("/me").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"passgate\""
    );
}

#[tokio::test]
async fn test_me_with_forged_token() {
    let (server, _) = server();
    let response = server
        .get("/me")
        .add_header(header::COOKIE, cookie_header("__session=forged.token.value"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let (server, state) = server();
    let cookie = log_in(&server, "alice:wonderland").await;
    assert_eq!(state.store.token_count(), 1);

    let response = server
        .post("/logout")
        .add_header(header::COOKIE, cookie_header(&cookie))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("__session=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(state.store.token_count(), 0);

    // The old token still verifies but no longer resolves to a user.
    let response = server
        .get("/me")
        .add_header(header::COOKIE, cookie_header(&cookie))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_twice() {
    let (server, _) = server();
    assert_eq!(server.post("/logout").await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(server.post("/logout").await.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_expired_session_is_renewed() {
    let (server, state) = server();
    let sessions = state.authenticator.sessions().unwrap();

    let now = unix_now();
    let mut claims = Claims::new("user-1");
    claims.iss = Some("passgate-test".to_string());
    claims.iat = now - 7200;
    claims.exp = now - 3600;
    let expired = sessions.codec().sign(&claims).unwrap();
    state.store.save_token(&claims).await.unwrap();

    let response = server
        .get("/me")
        .add_header(header::COOKIE, cookie_header(&format!("__session={expired}")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["username"], "alice");

    let renewed = set_cookie_pair(&response);
    assert_ne!(renewed, format!("__session={expired}"));
    assert!(!state.store.is_issued(&claims.jti));
    assert_eq!(state.store.token_count(), 1);
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
