#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Duration;
use devbook::{
    auth::jwt::{SigningSecret, TokenIssuer, TokenVerifier},
    auth::password::PasswordHasher,
    build_app,
    db::SqliteClient,
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-secret-key-32-chars!";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<SqliteClient>,
}

pub fn test_hasher() -> PasswordHasher {
    // Minimal cost keeps the suite fast
    PasswordHasher::from_cost(1024, 1, 1).expect("valid params")
}

pub fn test_secret() -> SigningSecret {
    SigningSecret::new(TEST_SECRET).expect("secret")
}

pub async fn create_test_app() -> TestApp {
    let store = Arc::new(SqliteClient::new_memory().await.expect("in-memory db"));
    let secret = test_secret();

    let state = AppState::new(
        store.clone(),
        TokenIssuer::new(&secret, Duration::hours(6)),
        test_hasher(),
    );
    let app = build_app(state, Arc::new(TokenVerifier::new(&secret)));

    TestApp {
        server: TestServer::new(app).expect("Failed to create test server"),
        store,
    }
}

/// A registered user and a token for them.
pub struct Account {
    pub id: i64,
    pub token: String,
}

pub async fn register(server: &TestServer, nick: &str, password: &str) -> Account {
    let response = server
        .post("/users")
        .json(&json!({
            "name": format!("{} Example", nick),
            "nick": nick,
            "email": format!("{}@example.com", nick),
            "password": password
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    Account {
        id: body["user"]["id"].as_i64().expect("user id"),
        token: body["token"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string(),
    }
}

pub async fn create_post(server: &TestServer, author: &Account, title: &str) -> i64 {
    let response = server
        .post("/posts")
        .authorization_bearer(&author.token)
        .json(&json!({ "title": title, "content": format!("{} body", title) }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["id"].as_i64().expect("post id")
}
