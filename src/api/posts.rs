//! Discussion-board endpoints: categories, posts, comments, like and
//! bookmark toggles.
//!
//! Reading is public; every mutation requires authentication. Posts are
//! soft-deleted and never resurface in listings or details.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_pagination, validate_text};
use crate::auth::{AuthUser, HasAuthState};
use crate::db::{Comment, Database, PostDetail};
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl HasAuthState for PostsState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/", post(create_post))
        .route("/", get(list_posts))
        .route("/{id}", get(get_post))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
        .route("/{id}/comments", post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/bookmark", post(toggle_bookmark))
        .with_state(state)
}

const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 20_000;
const MAX_COMMENT_LEN: usize = 2_000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    title: String,
    content: String,
    category_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    category_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    content: String,
    parent_comment_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetailResponse {
    #[serde(flatten)]
    post: PostDetail,
    comments: Vec<Comment>,
}

async fn list_categories(
    State(state): State<PostsState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .db
        .posts()
        .categories()
        .await
        .db_err("Failed to list categories")?;
    Ok(Json(categories))
}

async fn create_post(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_text(&request.title, "title", MAX_TITLE_LEN)?;
    validate_text(&request.content, "content", MAX_CONTENT_LEN)?;
    if !state
        .db
        .posts()
        .category_exists(request.category_id)
        .await
        .db_err("Failed to check category")?
    {
        return Err(ApiError::bad_request("Unknown category"));
    }

    let post_id = state
        .db
        .posts()
        .create(claims.sub, request.category_id, &request.title, &request.content)
        .await
        .db_err("Failed to create post")?;

    let detail = state
        .db
        .posts()
        .get_detail(post_id)
        .await
        .db_err("Failed to load post")?
        .ok_or_else(|| ApiError::internal("Post vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list_posts(
    State(state): State<PostsState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = validate_pagination(query.page, query.limit)?;
    let page = state
        .db
        .posts()
        .list(pagination.page, pagination.limit, query.category)
        .await
        .db_err("Failed to list posts")?;
    Ok(Json(page))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .posts()
        .get_detail(post_id)
        .await
        .db_err("Failed to load post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comments = state
        .db
        .comments()
        .list_by_post(post_id)
        .await
        .db_err("Failed to load comments")?;

    // Count the view after a successful read; a failed bump must not break
    // the response.
    if let Err(e) = state.db.posts().increment_views(post_id).await {
        tracing::warn!(error = %e, post_id, "Failed to bump view count");
    }

    Ok(Json(PostDetailResponse { post, comments }))
}

async fn update_post(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &request.title {
        validate_text(title, "title", MAX_TITLE_LEN)?;
    }
    if let Some(content) = &request.content {
        validate_text(content, "content", MAX_CONTENT_LEN)?;
    }
    if let Some(category_id) = request.category_id {
        if !state
            .db
            .posts()
            .category_exists(category_id)
            .await
            .db_err("Failed to check category")?
        {
            return Err(ApiError::bad_request("Unknown category"));
        }
    }

    let updated = state
        .db
        .posts()
        .update(
            claims.sub,
            post_id,
            request.title.as_deref(),
            request.content.as_deref(),
            request.category_id,
        )
        .await
        .db_err("Failed to update post")?;
    if !updated {
        return Err(ApiError::not_found("Post not found"));
    }

    let detail = state
        .db
        .posts()
        .get_detail(post_id)
        .await
        .db_err("Failed to load post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(detail))
}

async fn delete_post(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .posts()
        .soft_delete(claims.sub, post_id)
        .await
        .db_err("Failed to delete post")?;
    if !deleted {
        return Err(ApiError::not_found("Post not found"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn create_comment(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_text(&request.content, "content", MAX_COMMENT_LEN)?;

    let comment_id = state
        .db
        .comments()
        .create(
            post_id,
            claims.sub,
            request.parent_comment_id,
            &request.content,
        )
        .await
        .db_err("Failed to create comment")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": comment_id })),
    ))
}

async fn delete_comment(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .comments()
        .delete(claims.sub, comment_id)
        .await
        .db_err("Failed to delete comment")?;
    if !deleted {
        return Err(ApiError::not_found("Comment not found"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn toggle_like(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let liked = state
        .db
        .posts()
        .toggle_like(claims.sub, post_id)
        .await
        .db_err("Failed to toggle like")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(serde_json::json!({ "liked": liked })))
}

async fn toggle_bookmark(
    State(state): State<PostsState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmarked = state
        .db
        .posts()
        .toggle_bookmark(claims.sub, post_id)
        .await
        .db_err("Failed to toggle bookmark")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(serde_json::json!({ "bookmarked": bookmarked })))
}
