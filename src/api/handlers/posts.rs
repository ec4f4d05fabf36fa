use crate::{
    auth::middleware::AuthUser,
    types::{AppError, Post, PostId, PostRequest, Result, UserId},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// Publish a post as the authenticated user.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let draft = payload.prepare()?;
    let post = state.posts.create_post(principal.user_id, &draft).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Feed: the caller's posts plus posts by everyone they follow, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Feed", body = Vec<Post>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.posts.feed(principal.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "Post not found")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<PostId>,
) -> Result<Json<Post>> {
    state
        .posts
        .get_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
}

/// Edit a post. Only its author may do this.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostRequest,
    responses(
        (status = 204, description = "Post updated"),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<PostId>,
    Json(payload): Json<PostRequest>,
) -> Result<StatusCode> {
    state.guard.authorize_post_mutation(&principal, id).await?;

    let draft = payload.prepare()?;
    state.posts.update_post(id, &draft).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a post. Only its author may do this.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<PostId>,
) -> Result<StatusCode> {
    state.guard.authorize_post_mutation(&principal, id).await?;

    state.posts.delete_post(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// All posts by one author, newest first.
#[utoipa::path(
    get,
    path = "/users/{id}/posts",
    params(("id" = i64, Path, description = "Author ID")),
    responses((status = 200, description = "Posts by the user", body = Vec<Post>)),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn posts_by_user(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.posts.posts_by_author(id).await?))
}

#[utoipa::path(
    post,
    path = "/posts/{id}/like",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post liked"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn like(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<PostId>,
) -> Result<StatusCode> {
    state.posts.like(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/posts/{id}/unlike",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts",
    security(("bearer" = []))
)]
pub async fn unlike(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<PostId>,
) -> Result<StatusCode> {
    state.posts.unlike(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
