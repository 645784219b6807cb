use std::sync::Arc;

use account_api::config::Config;
use account_api::db::MemoryUserStore;
use account_api::models::auth::{Claims, RefreshClaims};
use account_api::models::user::{SignupRequest, UserRole};
use account_api::{routes, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "http-routes-test-secret";

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        database_url: None,
        secret_key: SECRET.to_string(),
        access_token_ttl_hours: 24,
        refresh_token_ttl_days: 7,
        store_timeout_secs: 100,
        bcrypt_cost: 4,
        host: "127.0.0.1".to_string(),
        port: 0,
    })
}

fn test_state() -> AppState {
    AppState::new(test_config(), Arc::new(MemoryUserStore::new()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn signup_body(email: &str, phone: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "phone": phone,
        "password": "correct-pw",
    })
}

async fn signup_and_login(app: &Router, email: &str, phone: &str) -> (String, String) {
    let (status, body) = send(app, post_json("/signup", signup_body(email, phone))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["inserted_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        post_json("/login", json!({ "email": email, "password": "correct-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (id, body["access_token"].as_str().unwrap().to_string())
}

async fn admin_token(state: &AppState, app: &Router) -> String {
    state
        .accounts
        .create(
            SignupRequest {
                first_name: "Root".into(),
                last_name: "Admin".into(),
                email: "root@x.com".into(),
                phone: "999".into(),
                password: "correct-pw".into(),
                role: Some(UserRole::Admin),
            },
            UserRole::Admin,
        )
        .await
        .unwrap();
    let (_, body) = send(
        app,
        post_json("/login", json!({ "email": "root@x.com", "password": "correct-pw" })),
    )
    .await;
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = routes::router(test_state());
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_duplicate_email_is_rejected() {
    let app = routes::router(test_state());

    let (status, body) = send(&app, post_json("/signup", signup_body("a@x.com", "111"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["inserted_id"].is_string());

    let (status, body) = send(&app, post_json("/signup", signup_body("a@x.com", "222"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_signup_validation_error() {
    let app = routes::router(test_state());
    let (status, _) = send(&app, post_json("/signup", signup_body("not-an-email", "111"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_missing_field_is_a_validation_error() {
    let app = routes::router(test_state());
    let mut body = signup_body("a@x.com", "111");
    body.as_object_mut().unwrap().remove("phone");

    let response = app.clone().oneshot(post_json("/signup", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn test_non_json_body_is_a_validation_error() {
    let app = routes::router(test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "text/plain")
        .body(Body::from("email=a@x.com"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_huge_page_size_does_not_overflow() {
    let state = test_state();
    let app = routes::router(state.clone());
    signup_and_login(&app, "b@x.com", "222").await;
    let admin = admin_token(&state, &app).await;

    let (status, body) = send(
        &app,
        get_with_token("/users?recordPerPage=18446744073709551615&page=3", &admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert!(body["user_items"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        get_with_token("/users?page=18446744073709551615&startIndex=18446744073709551615", &admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = routes::router(test_state());
    send(&app, post_json("/signup", signup_body("a@x.com", "111"))).await;

    let (status, body) = send(
        &app,
        post_json("/login", json!({ "email": "a@x.com", "password": "wrong-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("access_token").is_none());
}

#[tokio::test]
async fn test_password_past_bcrypt_limit_is_rejected() {
    let app = routes::router(test_state());
    let mut body = signup_body("a@x.com", "111");
    body["password"] = json!(format!("{}ONE", "a".repeat(72)));

    let (status, body) = send(&app, post_json("/signup", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("72"));
}

#[tokio::test]
async fn test_login_unknown_email() {
    let app = routes::router(test_state());
    let (status, _) = send(
        &app,
        post_json("/login", json!({ "email": "ghost@x.com", "password": "pw-pw-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_response_hides_secrets() {
    let app = routes::router(test_state());
    send(&app, post_json("/signup", signup_body("a@x.com", "111"))).await;

    let (status, body) = send(
        &app,
        post_json("/login", json!({ "email": "a@x.com", "password": "correct-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("token").is_none());
}

#[tokio::test]
async fn test_user_can_only_read_self() {
    let app = routes::router(test_state());
    let (u1, token) = signup_and_login(&app, "a@x.com", "111").await;
    let (u2, _) = signup_and_login(&app, "b@x.com", "222").await;

    let (status, body) = send(&app, get_with_token(&format!("/users/{u1}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], u1.as_str());

    let (status, _) = send(&app, get_with_token(&format!("/users/{u2}"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_reads_anyone_and_lists() {
    let state = test_state();
    let app = routes::router(state.clone());
    let (u2, user_token) = signup_and_login(&app, "b@x.com", "222").await;
    let admin = admin_token(&state, &app).await;

    let (status, body) = send(&app, get_with_token(&format!("/users/{u2}"), &admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "b@x.com");

    let (status, body) = send(&app, get_with_token("/users?recordPerPage=1&page=2", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["user_items"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get_with_token("/users", &user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = routes::router(test_state());
    let (status, _) = send(&app, Request::get("/users/u1").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_token_header_is_accepted() {
    let app = routes::router(test_state());
    let (u1, token) = signup_and_login(&app, "a@x.com", "111").await;

    let request = Request::get(format!("/users/{u1}"))
        .header("token", token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_secret_token_is_rejected() {
    let app = routes::router(test_state());
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "u1".into(),
        email: "a@x.com".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        role: UserRole::Admin,
        iat: now,
        exp: now + 3600,
        jti: "forged".into(),
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"not-the-server-secret"),
    )
    .unwrap();

    let (status, body) = send(&app, get_with_token("/users/u1", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token signature is invalid");
}

#[tokio::test]
async fn test_expired_and_refresh_tokens_are_rejected() {
    let app = routes::router(test_state());
    let now = chrono::Utc::now().timestamp();
    let key = EncodingKey::from_secret(SECRET.as_bytes());

    let expired = Claims {
        sub: "u1".into(),
        email: "a@x.com".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        role: UserRole::User,
        iat: now - 7200,
        exp: now - 3600,
        jti: "old".into(),
    };
    let token = encode(&Header::default(), &expired, &key).unwrap();
    let (status, body) = send(&app, get_with_token("/users/u1", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token has expired");

    let refresh = RefreshClaims { iat: now, exp: now + 3600, jti: "r".into() };
    let token = encode(&Header::default(), &refresh, &key).unwrap();
    let (status, body) = send(&app, get_with_token("/users/u1", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token is malformed");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = routes::router(test_state());
    send(&app, post_json("/signup", signup_body("a@x.com", "111"))).await;

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("api_signups_total"));
}
