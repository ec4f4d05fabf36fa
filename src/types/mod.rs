use crate::auth::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Database identity of a user; also the token subject.
pub type UserId = i64;
/// Database identity of a post.
pub type PostId = i64;

// ============= Domain Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nick: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated, trimmed user fields ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub nick: String,
    pub email: String,
}

/// Validated, trimmed post fields ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

// ============= Authentication Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: UserId,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64, user_id: UserId) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub token: TokenResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub current: String,
    pub new: String,
}

// ============= User & Post Requests =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: String,
    pub nick: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearch {
    /// Case-insensitive substring of a name or nick
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

// ============= Input Preparation =============

fn required(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{} is required and cannot be blank",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Shape check for `local@domain.tld`; deliverability is not our concern.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !host.ends_with('.'),
        None => false,
    }
}

fn profile(name: String, nick: String, email: String) -> Result<UserProfile> {
    let profile = UserProfile {
        name: required("name", name)?,
        nick: required("nick", nick)?,
        email: required("email", email)?,
    };
    if !is_valid_email(&profile.email) {
        return Err(AppError::InvalidInput(
            "the provided email is invalid".to_string(),
        ));
    }
    Ok(profile)
}

impl RegisterRequest {
    /// Validates registration input; returns the profile and raw password.
    pub fn prepare(self) -> Result<(UserProfile, String)> {
        let profile = profile(self.name, self.nick, self.email)?;
        if self.password.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "password is required and cannot be blank".to_string(),
            ));
        }
        Ok((profile, self.password))
    }
}

impl UpdateUserRequest {
    pub fn prepare(self) -> Result<UserProfile> {
        profile(self.name, self.nick, self.email)
    }
}

impl PasswordChangeRequest {
    pub fn validate(&self) -> Result<()> {
        if self.new.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "new password is required and cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

impl PostRequest {
    pub fn prepare(self) -> Result<PostDraft> {
        Ok(PostDraft {
            title: required("title", self.title)?,
            content: required("content", self.content)?,
        })
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Auth(err) => return err.into_response(),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "database failure");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (axum::http::StatusCode::CONFLICT, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
