use crate::{
    auth::middleware::AuthUser,
    types::{AppError, PasswordChangeRequest, Result, UpdateUserRequest, User, UserId, UserSearch},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// List users, optionally filtered by name or nick.
#[utoipa::path(
    get,
    path = "/users",
    params(UserSearch),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Query(search): Query<UserSearch>,
) -> Result<Json<Vec<User>>> {
    let users = state.users.list_users(search.user.as_deref()).await?;
    Ok(Json(users))
}

/// Get a single user.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    state
        .users
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
}

/// Update one's own profile.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not your account"),
        (status = 409, description = "Email or nick already taken")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<UserId>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode> {
    state.guard.authorize_user_mutation(&principal, id)?;

    let profile = payload.prepare()?;
    state.users.update_user(id, &profile).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete one's own account, with its posts and follow relations.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not your account")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    state.guard.authorize_user_mutation(&principal, id)?;

    state.users.delete_user(id).await?;
    tracing::info!(user_id = id, "user deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Follow another user.
#[utoipa::path(
    post,
    path = "/users/{id}/follow",
    params(("id" = i64, Path, description = "User to follow")),
    responses(
        (status = 204, description = "Now following"),
        (status = 403, description = "Cannot follow yourself"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    state.guard.authorize_relationship(&principal, id)?;

    if state.users.get_user(id).await?.is_none() {
        return Err(AppError::NotFound(format!("user {}", id)));
    }
    state.users.follow(id, principal.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Stop following another user.
#[utoipa::path(
    post,
    path = "/users/{id}/unfollow",
    params(("id" = i64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 403, description = "Cannot unfollow yourself")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    state.guard.authorize_relationship(&principal, id)?;

    state.users.unfollow(id, principal.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Users following the given user.
#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Followers", body = Vec<User>)),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn followers(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.followers(id).await?))
}

/// Users the given user follows.
#[utoipa::path(
    get,
    path = "/users/{id}/following",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Followed users", body = Vec<User>)),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn following(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.following(id).await?))
}

/// Change one's own password.
#[utoipa::path(
    post,
    path = "/users/{id}/password",
    params(("id" = i64, Path, description = "User ID")),
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password missing"),
        (status = 401, description = "Current password is wrong"),
        (status = 403, description = "Not your account")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<UserId>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<StatusCode> {
    state.guard.authorize_user_mutation(&principal, id)?;
    payload.validate()?;

    state
        .guard
        .change_password(&principal, id, &payload.current, &payload.new)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
