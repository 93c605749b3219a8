//! Read-only proxy endpoints over the public stray-animal API.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::shelter::{ListingQuery, ShelterClient};

#[derive(Clone)]
pub struct ShelterState {
    pub shelter: Arc<ShelterClient>,
}

pub fn router(state: ShelterState) -> Router {
    Router::new()
        .route("/sido", get(list_sido))
        .route("/sigungu", get(list_sigungu))
        .route("/kind", get(list_kinds))
        .route("/", get(list_animals))
        .with_state(state)
}

#[derive(Deserialize)]
struct SigunguQuery {
    upr_cd: String,
}

#[derive(Deserialize)]
struct KindQuery {
    up_kind_cd: String,
}

async fn list_sido(State(state): State<ShelterState>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .shelter
        .sido()
        .await
        .map_err(|e| ApiError::upstream_error("Failed to fetch provinces", e))?;
    Ok(Json(items))
}

async fn list_sigungu(
    State(state): State<ShelterState>,
    Query(query): Query<SigunguQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .shelter
        .sigungu(&query.upr_cd)
        .await
        .map_err(|e| ApiError::upstream_error("Failed to fetch districts", e))?;
    Ok(Json(items))
}

async fn list_kinds(
    State(state): State<ShelterState>,
    Query(query): Query<KindQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .shelter
        .kinds(&query.up_kind_cd)
        .await
        .map_err(|e| ApiError::upstream_error("Failed to fetch breed codes", e))?;
    Ok(Json(items))
}

async fn list_animals(
    State(state): State<ShelterState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .shelter
        .listings(&query)
        .await
        .map_err(|e| ApiError::upstream_error("Failed to fetch listings", e))?;
    Ok(Json(items))
}
