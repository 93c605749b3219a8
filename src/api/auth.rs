//! Authentication endpoints.
//!
//! - GET  `/kakao/code?code=` - login via authorization code
//! - POST `/kakao/token` - login via pre-obtained provider access token
//! - POST `/refresh` - exchange refresh token for a new access token
//! - POST `/rotate` - exchange refresh token for a new refresh token
//! - POST `/logout` - revoke one session (idempotent)
//! - POST `/logout-all` - revoke every session of the caller's account
//! - GET  `/devices` - device descriptors of the caller's live sessions

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthError, AuthService};

#[derive(Clone)]
pub struct AuthApiState {
    pub auth: Arc<AuthService>,
}

pub fn router(state: AuthApiState) -> Router {
    Router::new()
        .route("/kakao/code", get(login_with_code))
        .route("/kakao/token", post(login_with_token))
        .route("/refresh", post(refresh_access))
        .route("/rotate", post(rotate_refresh))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/devices", get(devices))
        .with_state(state)
}

/// Device descriptor for a new session: the client-identifying header when
/// present, a fixed default otherwise.
fn device_descriptor(headers: &HeaderMap, fallback: &'static str) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Deserialize)]
struct CodeQuery {
    code: String,
}

#[derive(Deserialize)]
struct ProviderTokenRequest {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest {
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenResponse {
    refresh_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn login_with_code(
    State(state): State<AuthApiState>,
    headers: HeaderMap,
    Query(query): Query<CodeQuery>,
) -> Result<impl IntoResponse, AuthError> {
    let device = device_descriptor(&headers, "mobile");
    let tokens = state.auth.login_with_code(&query.code, &device).await?;
    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

async fn login_with_token(
    State(state): State<AuthApiState>,
    headers: HeaderMap,
    Json(request): Json<ProviderTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let device = device_descriptor(&headers, "mobile");
    let tokens = state.auth.login_with_token(&request.token, &device).await?;
    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

async fn refresh_access(
    State(state): State<AuthApiState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let access_token = state.auth.new_access_token(&request.refresh_token).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

async fn rotate_refresh(
    State(state): State<AuthApiState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let refresh_token = state
        .auth
        .rotate_refresh_token(&request.refresh_token)
        .await?;
    Ok(Json(RefreshTokenResponse { refresh_token }))
}

async fn logout(
    State(state): State<AuthApiState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.logout(&request.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logout successful",
    }))
}

async fn logout_all(
    State(state): State<AuthApiState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.logout_all(&request.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out from all devices",
    }))
}

async fn devices(
    State(state): State<AuthApiState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let devices = state.auth.active_devices(&request.refresh_token).await?;
    Ok(Json(devices))
}
