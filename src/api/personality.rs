//! Personality-test endpoints: the question sheet, scoring and stored
//! results.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_score};
use crate::auth::{AuthUser, HasAuthState};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::personality::{classify, sheet};

#[derive(Clone)]
pub struct PersonalityState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl HasAuthState for PersonalityState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: PersonalityState) -> Router {
    Router::new()
        .route("/sheet", get(get_sheet))
        .route("/", post(create_result))
        .route("/", get(list_results))
        .route("/{id}", put(update_result))
        .route("/{id}", delete(delete_result))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResultRequest {
    pet_id: i64,
    introversion_extroversion: i64,
    dependence_leadership: i64,
    rationality_emotionality: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResultRequest {
    introversion_extroversion: i64,
    dependence_leadership: i64,
    rationality_emotionality: i64,
}

fn validate_scores(ie: i64, dl: i64, re: i64) -> Result<(), ApiError> {
    validate_score(ie, "introversionExtroversion")?;
    validate_score(dl, "dependenceLeadership")?;
    validate_score(re, "rationalityEmotionality")?;
    Ok(())
}

async fn get_sheet() -> impl IntoResponse {
    Json(sheet())
}

async fn create_result(
    State(state): State<PersonalityState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CreateResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_scores(
        request.introversion_extroversion,
        request.dependence_leadership,
        request.rationality_emotionality,
    )?;

    // The scored pet must belong to the caller.
    let pet = state
        .db
        .pets()
        .get(request.pet_id)
        .await
        .db_err("Failed to load pet")?
        .filter(|pet| pet.account_id == claims.sub)
        .ok_or_else(|| ApiError::not_found("Pet not found"))?;

    let personality = classify(
        request.introversion_extroversion,
        request.dependence_leadership,
        request.rationality_emotionality,
    );

    let id = state
        .db
        .personality_results()
        .create(
            claims.sub,
            pet.id,
            personality.as_str(),
            request.introversion_extroversion,
            request.dependence_leadership,
            request.rationality_emotionality,
        )
        .await
        .db_err("Failed to store result")?;

    let result = state
        .db
        .personality_results()
        .get(id)
        .await
        .db_err("Failed to load result")?
        .ok_or_else(|| ApiError::internal("Result vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_results(
    State(state): State<PersonalityState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .db
        .personality_results()
        .list_by_account(claims.sub)
        .await
        .db_err("Failed to list results")?;
    Ok(Json(results))
}

async fn update_result(
    State(state): State<PersonalityState>,
    AuthUser(claims): AuthUser,
    Path(result_id): Path<i64>,
    Json(request): Json<UpdateResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_scores(
        request.introversion_extroversion,
        request.dependence_leadership,
        request.rationality_emotionality,
    )?;

    let personality = classify(
        request.introversion_extroversion,
        request.dependence_leadership,
        request.rationality_emotionality,
    );

    let updated = state
        .db
        .personality_results()
        .update(
            claims.sub,
            result_id,
            personality.as_str(),
            request.introversion_extroversion,
            request.dependence_leadership,
            request.rationality_emotionality,
        )
        .await
        .db_err("Failed to update result")?;
    if !updated {
        return Err(ApiError::not_found("Result not found"));
    }

    let result = state
        .db
        .personality_results()
        .get(result_id)
        .await
        .db_err("Failed to load result")?
        .ok_or_else(|| ApiError::not_found("Result not found"))?;
    Ok(Json(result))
}

async fn delete_result(
    State(state): State<PersonalityState>,
    AuthUser(claims): AuthUser,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .personality_results()
        .delete(claims.sub, result_id)
        .await
        .db_err("Failed to delete result")?;
    if !deleted {
        return Err(ApiError::not_found("Result not found"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
