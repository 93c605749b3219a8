//! Identity-provider client.
//!
//! Exchanges an authorization code (or a pre-obtained provider access
//! token) for a normalized external identity. Pure I/O adapter: no state,
//! no retries — a failed login is surfaced to the user, who retries from
//! the login UI.

use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Outbound request timeout. Login is synchronous and user-initiated, so
/// fail fast rather than hang.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kakao endpoint and client configuration.
#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub token_url: Url,
    pub userinfo_url: Url,
}

/// Normalized identity record from the provider.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: String,
    pub nickname: String,
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub birthday: Option<String>,
}

/// The identity provider rejected us or returned something unusable.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamAuthError {
    #[error("HTTP error during {operation}: {source}")]
    Http {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("provider rejected {operation} (status {status}): {detail}")]
    Rejected {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("malformed provider response: {0}")]
    Malformed(&'static str),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    #[allow(dead_code)]
    id: Option<i64>,
    kakao_account: Option<KakaoAccount>,
}

#[derive(Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    profile: Option<KakaoProfile>,
    gender: Option<String>,
    age_range: Option<String>,
    birthday: Option<String>,
}

#[derive(Deserialize)]
struct KakaoProfile {
    nickname: Option<String>,
}

/// Client for the external identity provider.
pub struct KakaoClient {
    config: KakaoConfig,
    http: reqwest::Client,
}

impl KakaoClient {
    pub fn new(config: KakaoConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { config, http }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, UpstreamAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|source| UpstreamAuthError::Http {
                operation: "token exchange",
                source,
            })?;

        let response = Self::ensure_success(response, "token exchange").await?;
        let body: TokenResponse =
            response
                .json()
                .await
                .map_err(|source| UpstreamAuthError::Http {
                    operation: "token exchange",
                    source,
                })?;
        Ok(body.access_token)
    }

    /// Fetch the provider profile for an access token and normalize it.
    pub async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<ExternalIdentity, UpstreamAuthError> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| UpstreamAuthError::Http {
                operation: "userinfo request",
                source,
            })?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        let body: UserInfoResponse =
            response
                .json()
                .await
                .map_err(|source| UpstreamAuthError::Http {
                    operation: "userinfo request",
                    source,
                })?;

        let account = body
            .kakao_account
            .ok_or(UpstreamAuthError::Malformed("missing kakao_account"))?;
        let email = account
            .email
            .filter(|e| !e.is_empty())
            .ok_or(UpstreamAuthError::Malformed("missing email"))?;
        let nickname = account
            .profile
            .and_then(|p| p.nickname)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(ExternalIdentity {
            email,
            nickname,
            gender: account.gender,
            age_range: account.age_range,
            birthday: account.birthday,
        })
    }

    /// Checks HTTP response status; returns the response on success or an
    /// error carrying the upstream detail for server-side logging.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, UpstreamAuthError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(UpstreamAuthError::Rejected {
            operation,
            status,
            detail,
        })
    }
}
