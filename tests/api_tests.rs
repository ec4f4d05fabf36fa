mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_post, create_test_app, register, test_secret};
use devbook::auth::jwt::TokenIssuer;
use devbook::db::{CredentialStore, PostRepository, UserRepository};
use serde_json::{json, Value};

// ============= Public Routes =============

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = create_test_app().await;

    let response = app.server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/login"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer"].is_object());

    // Handlers that authenticate without reading the principal are documented too
    for path in [
        "/users",
        "/users/{id}",
        "/users/{id}/posts",
        "/users/{id}/followers",
        "/users/{id}/following",
        "/posts/{id}",
        "/posts/{id}/like",
        "/posts/{id}/unlike",
    ] {
        assert!(body["paths"][path].is_object(), "missing {}", path);
    }
    assert!(body["paths"]["/users/{id}"]["get"]["security"].is_array());
    assert!(body["paths"]["/posts/{id}/like"]["post"]["security"].is_array());
}

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "  Ada Lovelace ",
            "nick": "ada",
            "email": "ada@example.com",
            "password": "analytical"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert_eq!(body["user"]["nick"], "ada");
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["token"]["token_type"], "Bearer");
    assert_eq!(body["token"]["expires_in"], 21600);
    assert_eq!(body["token"]["user_id"], body["user"]["id"]);
}

#[tokio::test]
async fn test_register_stores_hash_not_plaintext() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "analytical").await;

    let stored = app
        .store
        .credential(ada.id)
        .await
        .expect("query")
        .expect("credential");

    assert_ne!(stored, "analytical");
    assert!(stored.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let app = create_test_app().await;
    register(&app.server, "ada", "analytical").await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Someone Else",
            "nick": "ada",
            "email": "other@example.com",
            "password": "pw"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_invalid_input() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Ada",
            "nick": "ada",
            "email": "not-an-email",
            "password": "pw"
        }))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Ada",
            "nick": "ada",
            "email": "ada@example.com",
            "password": "   "
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_login_success() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "analytical").await;

    let response = app
        .server
        .post("/login")
        .json(&json!({
            "email": "ada@example.com",
            "password": "analytical"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user_id"], ada.id);
    assert_eq!(body["token_type"], "Bearer");

    // The fresh token opens protected routes
    let token = body["access_token"].as_str().expect("token");
    app.server
        .get("/posts")
        .authorization_bearer(token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email() {
    let app = create_test_app().await;
    register(&app.server, "ada", "secret123").await;

    let wrong = app
        .server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "secret124" }))
        .await;
    wrong.assert_status_unauthorized();

    let unknown = app
        .server
        .post("/login")
        .json(&json!({ "email": "nobody@example.com", "password": "secret123" }))
        .await;
    unknown.assert_status_unauthorized();

    // Same body for both, so accounts cannot be enumerated
    assert_eq!(wrong.json::<Value>(), unknown.json::<Value>());
    assert_eq!(
        wrong.header("www-authenticate"),
        unknown.header("www-authenticate")
    );

    // Unknown email goes through the decoy verification and stays stable
    app.server
        .post("/login")
        .json(&json!({ "email": "ghost@example.com", "password": "" }))
        .await
        .assert_status_unauthorized();
}

// ============= Authentication =============

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app().await;

    for path in ["/users", "/posts", "/users/1", "/users/1/followers"] {
        let response = app.server.get(path).await;
        response.assert_status_unauthorized();
        assert_eq!(
            response.header("www-authenticate"),
            "Bearer",
            "{path} should advertise the bearer scheme"
        );
    }
}

#[tokio::test]
async fn test_rejected_request_performs_no_mutation() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/posts")
        .json(&json!({ "title": "sneaky", "content": "no token" }))
        .await;

    response.assert_status_unauthorized();
    assert!(app.store.posts_by_author(1).await.expect("query").is_empty());
}

#[tokio::test]
async fn test_invalid_tokens_are_unauthorized() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    let expired = TokenIssuer::new(&test_secret(), Duration::seconds(1))
        .issue_at(ada.id, Utc::now() - Duration::hours(1))
        .expect("token");
    let foreign = TokenIssuer::new(
        &devbook::auth::jwt::SigningSecret::new("another-secret").expect("secret"),
        Duration::hours(1),
    )
    .issue(ada.id)
    .expect("token");

    for token in [expired.as_str(), foreign.as_str(), "garbage"] {
        app.server
            .get("/posts")
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }
}

#[tokio::test]
async fn test_identity_only_comes_from_token() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;

    // A body field naming another author is ignored
    let response = app
        .server
        .post("/posts")
        .authorization_bearer(&ada.token)
        .json(&json!({ "title": "hi", "content": "there", "author_id": bob.id }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["author_id"], ada.id);
    assert_eq!(body["author_nick"], "ada");
}

// ============= Users =============

#[tokio::test]
async fn test_search_users() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    register(&app.server, "bob", "pw").await;

    let response = app
        .server
        .get("/users")
        .add_query_param("user", "AD")
        .authorization_bearer(&ada.token)
        .await;

    response.assert_status_ok();
    let users: Vec<Value> = response.json();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["nick"], "ada");

    let all: Vec<Value> = app
        .server
        .get("/users")
        .authorization_bearer(&ada.token)
        .await
        .json();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_get_user_and_not_found() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    let response = app
        .server
        .get(&format!("/users/{}", ada.id))
        .authorization_bearer(&ada.token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "ada@example.com");

    app.server
        .get("/users/9999")
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_id_is_bad_request() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    app.server
        .get("/users/abc")
        .authorization_bearer(&ada.token)
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_update_user_self_only() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;

    let update = json!({ "name": "Ada L.", "nick": "ada", "email": "ada@example.org" });

    app.server
        .put(&format!("/users/{}", bob.id))
        .authorization_bearer(&ada.token)
        .json(&update)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let untouched = app.store.get_user(bob.id).await.expect("query").expect("bob");
    assert_eq!(untouched.email, "bob@example.com");

    app.server
        .put(&format!("/users/{}", ada.id))
        .authorization_bearer(&ada.token)
        .json(&update)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let updated = app.store.get_user(ada.id).await.expect("query").expect("ada");
    assert_eq!(updated.name, "Ada L.");
    assert_eq!(updated.email, "ada@example.org");
}

#[tokio::test]
async fn test_update_user_to_taken_nick_conflicts() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    register(&app.server, "bob", "pw").await;

    app.server
        .put(&format!("/users/{}", ada.id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "name": "Ada", "nick": "bob", "email": "ada@example.com" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_user_self_only() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;

    app.server
        .delete(&format!("/users/{}", bob.id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert!(app.store.get_user(bob.id).await.expect("query").is_some());

    app.server
        .delete(&format!("/users/{}", ada.id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(app.store.get_user(ada.id).await.expect("query").is_none());
}

#[tokio::test]
async fn test_token_outlives_account_deletion() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    app.server
        .delete(&format!("/users/{}", ada.id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // No revocation: the token stays valid until it expires
    app.server
        .get("/users")
        .authorization_bearer(&ada.token)
        .await
        .assert_status_ok();
}

// ============= Follow Relations =============

#[tokio::test]
async fn test_follow_and_unfollow() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;

    for _ in 0..2 {
        app.server
            .post(&format!("/users/{}/follow", bob.id))
            .authorization_bearer(&ada.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let followers: Vec<Value> = app
        .server
        .get(&format!("/users/{}/followers", bob.id))
        .authorization_bearer(&ada.token)
        .await
        .json();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0]["id"], ada.id);

    let following: Vec<Value> = app
        .server
        .get(&format!("/users/{}/following", ada.id))
        .authorization_bearer(&ada.token)
        .await
        .json();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0]["id"], bob.id);

    app.server
        .post(&format!("/users/{}/unfollow", bob.id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(app.store.followers(bob.id).await.expect("query").is_empty());
}

#[tokio::test]
async fn test_self_follow_is_forbidden() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    for action in ["follow", "unfollow"] {
        app.server
            .post(&format!("/users/{}/{}", ada.id, action))
            .authorization_bearer(&ada.token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
    assert!(app.store.followers(ada.id).await.expect("query").is_empty());
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    app.server
        .post("/users/9999/follow")
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============= Password Change =============

#[tokio::test]
async fn test_change_password() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "secret123").await;

    app.server
        .post(&format!("/users/{}/password", ada.id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "current": "secret123", "new": "brand-new" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "secret123" }))
        .await
        .assert_status_unauthorized();
    app.server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "brand-new" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_change_password_wrong_current() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "secret123").await;
    let before = app.store.credential(ada.id).await.expect("query");

    app.server
        .post(&format!("/users/{}/password", ada.id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "current": "secret124", "new": "brand-new" }))
        .await
        .assert_status_unauthorized();

    assert_eq!(app.store.credential(ada.id).await.expect("query"), before);
}

#[tokio::test]
async fn test_change_password_of_other_user_is_forbidden() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "secret123").await;
    let bob = register(&app.server, "bob", "secret123").await;
    let before = app.store.credential(bob.id).await.expect("query");

    // Correct current password for bob, but the token is ada's
    app.server
        .post(&format!("/users/{}/password", bob.id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "current": "secret123", "new": "hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(app.store.credential(bob.id).await.expect("query"), before);
}

// ============= Posts =============

#[tokio::test]
async fn test_create_and_get_post() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let post_id = create_post(&app.server, &ada, "First").await;

    let response = app
        .server
        .get(&format!("/posts/{}", post_id))
        .authorization_bearer(&ada.token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "First");
    assert_eq!(body["likes"], 0);

    app.server
        .get("/posts/9999")
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_post_requires_fields() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    app.server
        .post("/posts")
        .authorization_bearer(&ada.token)
        .json(&json!({ "title": "  ", "content": "body" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_foreign_post_mutation_is_forbidden() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;
    let post_id = create_post(&app.server, &bob, "Bob's").await;

    app.server
        .put(&format!("/posts/{}", post_id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "title": "Defaced", "content": "gotcha" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&format!("/posts/{}", post_id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let post = app.store.get_post(post_id).await.expect("query").expect("post");
    assert_eq!(post.title, "Bob's");
}

#[tokio::test]
async fn test_owner_updates_and_deletes_post() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let post_id = create_post(&app.server, &ada, "Draft").await;

    app.server
        .put(&format!("/posts/{}", post_id))
        .authorization_bearer(&ada.token)
        .json(&json!({ "title": "Final", "content": "done" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let post = app.store.get_post(post_id).await.expect("query").expect("post");
    assert_eq!(post.title, "Final");

    app.server
        .delete(&format!("/posts/{}", post_id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(app.store.get_post(post_id).await.expect("query").is_none());
}

#[tokio::test]
async fn test_mutating_missing_post_is_not_found() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;

    app.server
        .delete("/posts/9999")
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_and_user_posts() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;
    let carol = register(&app.server, "carol", "pw").await;

    create_post(&app.server, &ada, "ada-1").await;
    create_post(&app.server, &bob, "bob-1").await;
    create_post(&app.server, &carol, "carol-1").await;
    create_post(&app.server, &bob, "bob-2").await;

    app.server
        .post(&format!("/users/{}/follow", bob.id))
        .authorization_bearer(&ada.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let feed: Vec<Value> = app
        .server
        .get("/posts")
        .authorization_bearer(&ada.token)
        .await
        .json();
    let titles: Vec<&str> = feed.iter().filter_map(|p| p["title"].as_str()).collect();
    assert_eq!(titles, vec!["bob-2", "bob-1", "ada-1"]);

    let bobs: Vec<Value> = app
        .server
        .get(&format!("/users/{}/posts", bob.id))
        .authorization_bearer(&carol.token)
        .await
        .json();
    assert_eq!(bobs.len(), 2);
}

#[tokio::test]
async fn test_like_and_unlike() {
    let app = create_test_app().await;
    let ada = register(&app.server, "ada", "pw").await;
    let bob = register(&app.server, "bob", "pw").await;
    let post_id = create_post(&app.server, &ada, "Likeable").await;

    app.server
        .post(&format!("/posts/{}/like", post_id))
        .authorization_bearer(&bob.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let post = app.store.get_post(post_id).await.expect("query").expect("post");
    assert_eq!(post.likes, 1);

    for _ in 0..2 {
        app.server
            .post(&format!("/posts/{}/unlike", post_id))
            .authorization_bearer(&bob.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    let post = app.store.get_post(post_id).await.expect("query").expect("post");
    assert_eq!(post.likes, 0);

    app.server
        .post("/posts/9999/like")
        .authorization_bearer(&bob.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
