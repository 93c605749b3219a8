//! Pet CRUD endpoints. All endpoints require authentication and operate on
//! the caller's own pets.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_text};
use crate::auth::{AuthUser, HasAuthState};
use crate::db::Database;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct PetsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl HasAuthState for PetsState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: PetsState) -> Router {
    Router::new()
        .route("/", post(create_pet))
        .route("/", get(list_pets))
        .route("/{id}", get(get_pet))
        .route("/{id}", put(update_pet))
        .route("/{id}", delete(delete_pet))
        .with_state(state)
}

#[derive(Deserialize)]
struct PetRequest {
    name: String,
    breed: Option<String>,
    age: Option<i64>,
    birth: Option<String>,
}

fn validate_pet(request: &PetRequest) -> Result<(), ApiError> {
    validate_text(&request.name, "name", 50)?;
    if let Some(age) = request.age {
        if !(0..=100).contains(&age) {
            return Err(ApiError::bad_request("age must be between 0 and 100"));
        }
    }
    Ok(())
}

async fn create_pet(
    State(state): State<PetsState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<PetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_pet(&request)?;

    let pet_id = state
        .db
        .pets()
        .create(
            claims.sub,
            request.name.trim(),
            request.breed.as_deref(),
            request.age,
            request.birth.as_deref(),
        )
        .await
        .db_err("Failed to create pet")?;

    let pet = state
        .db
        .pets()
        .get(pet_id)
        .await
        .db_err("Failed to load pet")?
        .ok_or_else(|| ApiError::internal("Pet vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(pet)))
}

async fn list_pets(
    State(state): State<PetsState>,
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

async fn get_pet(
    State(state): State<PetsState>,
    AuthUser(claims): AuthUser,
    Path(pet_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state
        .db
        .pets()
        .get(pet_id)
        .await
        .db_err("Failed to load pet")?
        .filter(|pet| pet.account_id == claims.sub)
        .ok_or_else(|| ApiError::not_found("Pet not found"))?;
    Ok(Json(pet))
}

async fn update_pet(
    State(state): State<PetsState>,
    AuthUser(claims): AuthUser,
    Path(pet_id): Path<i64>,
    Json(request): Json<PetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_pet(&request)?;

    let updated = state
        .db
        .pets()
        .update(
            claims.sub,
            pet_id,
            request.name.trim(),
            request.breed.as_deref(),
            request.age,
            request.birth.as_deref(),
        )
        .await
        .db_err("Failed to update pet")?;
    if !updated {
        return Err(ApiError::not_found("Pet not found"));
    }

    let pet = state
        .db
        .pets()
        .get(pet_id)
        .await
        .db_err("Failed to load pet")?
        .ok_or_else(|| ApiError::not_found("Pet not found"))?;
    Ok(Json(pet))
}

async fn delete_pet(
    State(state): State<PetsState>,
    AuthUser(claims): AuthUser,
    Path(pet_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .pets()
        .delete(claims.sub, pet_id)
        .await
        .db_err("Failed to delete pet")?;
    if !deleted {
        return Err(ApiError::not_found("Pet not found"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
