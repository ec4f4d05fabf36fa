use crate::auth::jwt::{Principal, TokenVerifier};
use crate::auth::AuthError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Pulls the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively. Anything else, including an
/// empty token, counts as a missing credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredentialsHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredentialsHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredentialsHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredentialsHeader);
    }

    Ok(token)
}

/// Request authenticator for protected routes.
///
/// Resolves exactly one [`Principal`] or rejects before the wrapped handler
/// runs. On success the principal is stored in the request extensions.
pub async fn authenticate(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = bearer_token(req.headers())
        .and_then(|token| verifier.verify(token))
        .inspect_err(|e| {
            tracing::debug!(
                method = %req.method(),
                uri = %req.uri(),
                reason = %e,
                "rejected unauthenticated request"
            );
        })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Extractor for the principal attached by [`authenticate`].
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .map(AuthUser)
            .ok_or(AuthError::MissingCredentialsHeader)
    }
}
