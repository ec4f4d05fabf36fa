use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Every way the authentication and authorization core can reject a request.
///
/// All variants are terminal for the request. None of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingCredentialsHeader,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid credentials")]
    WrongPassword,

    #[error("Not allowed to modify a resource owned by another user")]
    OwnershipViolation,

    #[error("A user cannot target themselves with this operation")]
    SelfTargetViolation,

    #[error("Failed to hash password: {0}")]
    HashingFailure(String),

    #[error("Failed to sign token: {0}")]
    TokenSigningFailure(String),
}

impl AuthError {
    /// HTTP status the error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentialsHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::WrongPassword => StatusCode::UNAUTHORIZED,
            AuthError::OwnershipViolation | AuthError::SelfTargetViolation => {
                StatusCode::FORBIDDEN
            }
            AuthError::HashingFailure(_) | AuthError::TokenSigningFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal detail stays in the logs
            AuthError::HashingFailure(detail) => {
                tracing::error!(error = %detail, "password hashing failed");
                "Internal server error".to_string()
            }
            AuthError::TokenSigningFailure(detail) => {
                tracing::error!(error = %detail, "token signing failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(serde_json::json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
