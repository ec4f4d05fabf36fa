//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for devbook, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Public
//! - `GET /health` - Health check endpoint
//! - `POST /login` - Login and receive a bearer token
//! - `POST /users` - Register a new user
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! ## Users (`/users`)
//! - `GET /users?user=<filter>` - Search users by name or nick
//! - `GET|PUT|DELETE /users/{id}` - Read, update or delete a profile
//! - `POST /users/{id}/follow`, `POST /users/{id}/unfollow`
//! - `GET /users/{id}/followers`, `GET /users/{id}/following`
//! - `POST /users/{id}/password` - Change password
//! - `GET /users/{id}/posts` - Posts by a user
//!
//! ## Posts (`/posts`)
//! - `GET /posts` - Feed
//! - `POST /posts` - Create a post
//! - `GET|PUT|DELETE /posts/{id}`
//! - `POST /posts/{id}/like`, `POST /posts/{id}/unlike`
//!
//! # Authentication
//!
//! Everything except the public routes requires a valid token in the
//! `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    LoginRequest, PasswordChangeRequest, Post, PostRequest, RegisterRequest, RegisterResponse,
    TokenResponse, UpdateUserRequest, User,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI description of the whole HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::follow,
        handlers::users::unfollow,
        handlers::users::followers,
        handlers::users::following,
        handlers::users::change_password,
        handlers::posts::create_post,
        handlers::posts::feed,
        handlers::posts::get_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::posts::posts_by_user,
        handlers::posts::like,
        handlers::posts::unlike,
    ),
    components(schemas(
        User,
        Post,
        LoginRequest,
        RegisterRequest,
        RegisterResponse,
        TokenResponse,
        PasswordChangeRequest,
        UpdateUserRequest,
        PostRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Profiles and follow relations"),
        (name = "posts", description = "Posts, feed and likes")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
