mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use common::{
    InMemoryRepo, MockNoteApi, MockSessionStore, TEST_USER_ID, create_app_state, create_token,
};
use notes_portal::{AppState, auth::AuthUser, config::Env};
use std::sync::Arc;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn app_state(env: Env) -> AppState {
    let mut state = create_app_state(
        Arc::new(InMemoryRepo::default()),
        Arc::new(MockSessionStore::default()),
        Arc::new(MockNoteApi::found("unused")),
    );
    state.config.env = env;
    state.config.jwt_secret = TEST_JWT_SECRET.to_string();
    state
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_header(name: header::HeaderName, value: String) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts
        .headers
        .insert(name, header::HeaderValue::from_str(&value).unwrap());
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, 3600);
    let mut parts = with_header(header::AUTHORIZATION, format!("Bearer {}", token));

    let user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production))
        .await
        .unwrap();

    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.email.as_deref(), Some("user@example.com"));
}

#[tokio::test]
async fn test_auth_success_with_session_cookie() {
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, 3600);
    let mut parts = with_header(header::COOKIE, format!("theme=dark; sb-access-token={}", token));

    let user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production))
        .await
        .unwrap();

    assert_eq!(user.id, TEST_USER_ID);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production)).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, -60);
    let mut parts = with_header(header::AUTHORIZATION, format!("Bearer {}", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production)).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let token = create_token(TEST_USER_ID, "not-the-provider-secret", 3600);
    let mut parts = with_header(header::AUTHORIZATION, format!("Bearer {}", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production)).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mut parts = with_header(
        header::HeaderName::from_static("x-user-id"),
        mock_user_id.to_string(),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Local))
        .await
        .unwrap();

    assert_eq!(user.id, mock_user_id);
    assert!(user.email.is_none());
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mut parts = with_header(
        header::HeaderName::from_static("x-user-id"),
        Uuid::new_v4().to_string(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state(Env::Production)).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}
