//! Authentication and authorization core
//!
//! Everything between an incoming HTTP request and a verified, authorized
//! principal lives here.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id hashing and verification
//! - [`auth::jwt`](crate::auth::jwt) - HS256 token issuing and verification
//! - [`auth::middleware`](crate::auth::middleware) - Axum layer and extractor for protected routes
//! - [`auth::guard`](crate::auth::guard) - Ownership and self-target rules for mutations
//! - [`auth::error`](crate::auth::error) - The shared rejection type
//!
//! # Usage
//!
//! ```ignore
//! use devbook::auth::jwt::{SigningSecret, TokenIssuer, TokenVerifier};
//! use devbook::auth::middleware::authenticate;
//!
//! let secret = SigningSecret::new(std::env::var("SECRET_KEY")?)?;
//! let issuer = TokenIssuer::new(&secret, chrono::Duration::hours(6));
//! let verifier = Arc::new(TokenVerifier::new(&secret));
//!
//! let protected = Router::new()
//!     .route("/posts", post(create_post))
//!     .layer(axum::middleware::from_fn_with_state(verifier, authenticate));
//! ```
//!
//! # Configuration
//!
//! Configure via `devbook.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "SECRET_KEY"   # Env var holding the signing secret
//! token_ttl_secs = 21600          # Six hours
//! ```

/// Rejection type shared by every auth component.
pub mod error;
/// Authorization rules for mutating operations.
pub mod guard;
/// Bearer token issuing and verification.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing.
pub mod password;

pub use error::AuthError;
