//! # devbook
//!
//! HTTP backend for a small social network: users, posts, follow relations
//! and likes, behind JWT bearer authentication.
//!
//! The interesting part is [`auth`]: Argon2id password hashing, HS256 token
//! issuing and verification, the request authenticator layer, and the
//! ownership rules every mutating request goes through. The rest of the crate
//! is plumbing around it: axum handlers in [`api`], libsql persistence in
//! [`db`], and TOML configuration in [`utils`].
//!
//! ```ignore
//! let config = devbook::Config::load("devbook.toml")?;
//! let secret = config.signing_secret()?;
//! let store = Arc::new(SqliteClient::new_local(&config.database.url).await?);
//!
//! let state = AppState::new(
//!     store,
//!     TokenIssuer::new(&secret, config.token_ttl()?),
//!     config.password_hasher()?,
//! );
//! let app = build_app(state, Arc::new(TokenVerifier::new(&secret)));
//! ```

/// HTTP API handlers and routes.
pub mod api;
/// Authentication and authorization core.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Persistence contracts and the libsql store.
pub mod db;
/// Core types (records, requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use types::{AppError, Result};
pub use utils::toml_config::Config;

use crate::auth::guard::AuthorizationGuard;
use crate::auth::jwt::{TokenIssuer, TokenVerifier};
use crate::auth::password::PasswordHasher;
use crate::db::traits::{PostRepository, UserRepository};
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// User and follow storage
    pub users: Arc<dyn UserRepository>,
    /// Post and like storage
    pub posts: Arc<dyn PostRepository>,
    /// Mints tokens on login and registration
    pub issuer: Arc<TokenIssuer>,
    /// Password hashing for registration and login
    pub hasher: PasswordHasher,
    /// Ownership rules for mutations
    pub guard: Arc<AuthorizationGuard>,
}

impl AppState {
    /// Wires every component to a single store.
    pub fn new<S>(store: Arc<S>, issuer: TokenIssuer, hasher: PasswordHasher) -> Self
    where
        S: UserRepository + PostRepository + 'static,
    {
        let guard = AuthorizationGuard::new(store.clone(), store.clone(), hasher.clone());

        Self {
            users: store.clone(),
            posts: store,
            issuer: Arc::new(issuer),
            hasher,
            guard: Arc::new(guard),
        }
    }
}

/// Full application router: routes, authentication, request tracing and CORS.
pub fn build_app(state: AppState, verifier: Arc<TokenVerifier>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::routes::create_router(verifier)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
