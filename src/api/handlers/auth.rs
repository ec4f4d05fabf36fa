use crate::{
    types::{LoginRequest, RegisterRequest, RegisterResponse, Result, TokenResponse, UserId},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "health"
)]
pub async fn health() -> &'static str {
    "OK"
}

fn token_response(state: &AppState, user_id: UserId) -> Result<TokenResponse> {
    let access_token = state.issuer.issue(user_id)?;
    Ok(TokenResponse::bearer(
        access_token,
        state.issuer.ttl().num_seconds(),
        user_id,
    ))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or nick already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    // Validate before spending time on the hash
    let (profile, password) = payload.prepare()?;

    let password_hash = state.hasher.hash_blocking(password).await?;
    let user = state.users.create_user(&profile, &password_hash).await?;

    let token = token_response(&state, user.id)?;
    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    // Unknown email and wrong password are indistinguishable to the client,
    // in body and in time
    let Some(credential) = state
        .users
        .credential_by_email(payload.email.trim())
        .await?
    else {
        return Err(state.hasher.reject_unknown_blocking(payload.password).await.into());
    };

    state
        .hasher
        .verify_blocking(credential.password_hash, payload.password)
        .await?;

    Ok(Json(token_response(&state, credential.user_id)?))
}
