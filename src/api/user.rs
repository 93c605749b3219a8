//! Current-user endpoints: profile, own content, profile image.
//!
//! All endpoints require a verified access credential.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_pagination, validate_text};
use crate::auth::{AuthUser, HasAuthState};
use crate::db::{Account, Database};
use crate::jwt::JwtConfig;
use crate::media::MediaStore;

#[derive(Clone)]
pub struct UserState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub media: Arc<dyn MediaStore>,
}

impl HasAuthState for UserState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: UserState) -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
        .route("/me/posts", get(my_posts))
        .route("/me/pets", get(my_pets))
        .route("/me/activity", get(my_activity))
        .route("/me/bookmarks", get(my_bookmarks))
        .route("/me/profile-image", post(upload_profile_image))
        .route("/me/profile-image", delete(delete_profile_image))
        // The default axum body limit is below the image cap.
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 16 * 1024))
        .with_state(state)
}

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    id: i64,
    email: String,
    origin: crate::db::Origin,
    role: crate::db::Role,
    gender: Option<String>,
    age_range: Option<String>,
    birthday: Option<String>,
    registered_at: String,
    nickname: String,
    image_url: Option<String>,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            origin: account.origin,
            role: account.role,
            gender: account.gender,
            age_range: account.age_range,
            birthday: account.birthday,
            registered_at: account.created_at,
            nickname: account.nickname,
            image_url: account.image_url,
        }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    nickname: String,
}

async fn load_account(db: &Database, account_id: i64) -> Result<Account, ApiError> {
    db.accounts()
        .get_by_id(account_id)
        .await
        .db_err("Failed to load account")?
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

async fn get_me(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let account = load_account(&state.db, claims.sub).await?;
    Ok(Json(ProfileResponse::from(account)))
}

async fn update_me(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_text(&request.nickname, "nickname", 30)?;

    let updated = state
        .db
        .accounts()
        .update_nickname(claims.sub, request.nickname.trim())
        .await
        .db_err("Failed to update nickname")?;
    if !updated {
        return Err(ApiError::not_found("Profile not found"));
    }

    let account = load_account(&state.db, claims.sub).await?;
    Ok(Json(ProfileResponse::from(account)))
}

async fn my_posts(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = validate_pagination(query.page, query.limit)?;
    let page = state
        .db
        .posts()
        .list_by_account(claims.sub, pagination.page, pagination.limit)
        .await
        .db_err("Failed to list posts")?;
    Ok(Json(page))
}

async fn my_pets(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let pets = state
        .db
        .pets()
        .list_by_account(claims.sub)
        .await
        .db_err("Failed to list pets")?;
    Ok(Json(pets))
}

async fn my_activity(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let activity = state
        .db
        .posts()
        .activity(claims.sub)
        .await
        .db_err("Failed to load activity")?;
    Ok(Json(activity))
}

async fn my_bookmarks(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = validate_pagination(query.page, query.limit)?;
    let page = state
        .db
        .posts()
        .bookmarks(claims.sub, pagination.page, pagination.limit)
        .await
        .db_err("Failed to list bookmarks")?;
    Ok(Json(page))
}

/// Read the `image` field out of the multipart form.
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart body"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::bad_request("File must be an image"));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::bad_request("Invalid file extension"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Failed to read image data"))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("Image file is empty"));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::bad_request("Image file is too large"));
        }

        return Ok((extension, data.to_vec()));
    }

    Err(ApiError::bad_request("Image file is required"))
}

async fn upload_profile_image(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (extension, data) = read_image_field(&mut multipart).await?;

    let account = load_account(&state.db, claims.sub).await?;

    let key = format!("profile-images/{}.{}", uuid::Uuid::new_v4(), extension);
    state
        .media
        .put(&key, &data)
        .media_err("Failed to store profile image")?;
    let url = state.media.url_for(&key);

    state
        .db
        .accounts()
        .update_image_url(claims.sub, Some(&url))
        .await
        .db_err("Failed to update profile image")?;

    // Drop the replaced image, if any. Best effort: the new image is
    // already live.
    if let Some(old_url) = account.image_url {
        if let Some(old_key) = state.media.key_for_url(&old_url) {
            if let Err(e) = state.media.delete(old_key) {
                tracing::warn!(error = %e, "Failed to delete replaced profile image");
            }
        }
    }

    let account = load_account(&state.db, claims.sub).await?;
    Ok(Json(ProfileResponse::from(account)))
}

async fn delete_profile_image(
    State(state): State<UserState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let account = load_account(&state.db, claims.sub).await?;

    if let Some(url) = &account.image_url {
        if let Some(key) = state.media.key_for_url(url) {
            state
                .media
                .delete(key)
                .media_err("Failed to delete profile image")?;
        }
        state
            .db
            .accounts()
            .update_image_url(claims.sub, None)
            .await
            .db_err("Failed to clear profile image")?;
    }

    let account = load_account(&state.db, claims.sub).await?;
    Ok(Json(ProfileResponse::from(account)))
}
