use crate::api::{handlers, ApiDoc};
use crate::auth::jwt::TokenVerifier;
use crate::auth::middleware::authenticate;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

pub fn create_router(verifier: Arc<TokenVerifier>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/health", get(handlers::auth::health))
        .route("/login", post(handlers::auth::login))
        .route("/users", post(handlers::auth::register))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let protected_routes = Router::new()
        // User routes
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{id}/follow", post(handlers::users::follow))
        .route("/users/{id}/unfollow", post(handlers::users::unfollow))
        .route("/users/{id}/followers", get(handlers::users::followers))
        .route("/users/{id}/following", get(handlers::users::following))
        .route(
            "/users/{id}/password",
            post(handlers::users::change_password),
        )
        .route("/users/{id}/posts", get(handlers::posts::posts_by_user))
        // Post routes
        .route(
            "/posts",
            get(handlers::posts::feed).post(handlers::posts::create_post),
        )
        .route(
            "/posts/{id}",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route("/posts/{id}/like", post(handlers::posts::like))
        .route("/posts/{id}/unlike", post(handlers::posts::unlike))
        .layer(middleware::from_fn_with_state(verifier, authenticate));

    public_routes.merge(protected_routes)
}
