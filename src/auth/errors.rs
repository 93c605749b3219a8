//! Authentication error types.
//!
//! Everything a caller could use to probe the session store or the signing
//! scheme collapses to one generic 401 at this boundary. Upstream and
//! database detail is logged server-side only.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::jwt::JwtError;
use crate::kakao::UpstreamAuthError;

#[derive(Debug)]
pub enum AuthError {
    /// Token missing, expired, rotated away or revoked. Deliberately
    /// cause-free toward the caller.
    Unauthorized,
    /// The identity provider rejected us or was unreachable.
    Upstream(UpstreamAuthError),
    /// Account and profile could not be created together.
    Provisioning,
    Database(sqlx::Error),
    Credential(JwtError),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

impl From<UpstreamAuthError> for AuthError {
    fn from(e: UpstreamAuthError) -> Self {
        AuthError::Upstream(e)
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::Credential(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::Upstream(e) => {
                error!(error = %e, "Identity provider failure");
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            AuthError::Provisioning => (StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
            AuthError::Database(e) => {
                error!(error = %e, "Database error during authentication");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
            AuthError::Credential(e) => {
                error!(error = %e, "Failed to mint credential");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
