//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::kakao::KakaoConfig;
use crate::shelter::ShelterConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Pawhub", about = "Community backend for pet owners")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "pawhub.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access-credential lifetime in seconds
    #[arg(long, default_value_t = crate::jwt::DEFAULT_ACCESS_TTL_SECS)]
    pub access_ttl_secs: u64,

    /// Refresh-session lifetime in seconds
    #[arg(long, default_value_t = crate::jwt::DEFAULT_REFRESH_TTL_SECS)]
    pub refresh_ttl_secs: u64,

    /// Kakao REST API client id
    #[arg(long, env = "KAKAO_CLIENT_ID", default_value = "")]
    pub kakao_client_id: String,

    /// Redirect URI registered with the identity provider
    #[arg(long, env = "KAKAO_REDIRECT_URI", default_value = "")]
    pub kakao_redirect_uri: String,

    /// Identity-provider token endpoint
    #[arg(long, default_value = "https://kauth.kakao.com/oauth/token")]
    pub kakao_token_url: String,

    /// Identity-provider profile endpoint
    #[arg(long, default_value = "https://kapi.kakao.com/v2/user/me")]
    pub kakao_userinfo_url: String,

    /// Base URL of the public stray-animal API
    #[arg(
        long,
        default_value = "https://apis.data.go.kr/1543061/abandonmentPublicSrvc"
    )]
    pub shelter_api_url: String,

    /// Service key for the public stray-animal API
    #[arg(long, env = "SHELTER_SERVICE_KEY", default_value = "")]
    pub shelter_service_key: String,

    /// Directory for uploaded profile images
    #[arg(long, default_value = "media")]
    pub media_dir: PathBuf,

    /// URL prefix the media directory is served under
    #[arg(long, default_value = "/media")]
    pub media_public_base: String,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Parse and validate an upstream endpoint URL.
/// Returns None and logs an error if validation fails.
pub fn validate_endpoint(name: &str, value: &str) -> Option<Url> {
    match Url::parse(value) {
        Ok(url) => Some(url),
        Err(e) => {
            error!(endpoint = %name, value = %value, error = %e, "Invalid endpoint URL");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    db: Database,
    jwt_secret: String,
    kakao_token_url: Url,
    kakao_userinfo_url: Url,
    shelter_api_url: Url,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_ttl_secs: args.access_ttl_secs,
        refresh_ttl_secs: args.refresh_ttl_secs,
        kakao: KakaoConfig {
            client_id: args.kakao_client_id.clone(),
            redirect_uri: args.kakao_redirect_uri.clone(),
            token_url: kakao_token_url,
            userinfo_url: kakao_userinfo_url,
        },
        shelter: ShelterConfig {
            base_url: shelter_api_url,
            service_key: args.shelter_service_key.clone(),
        },
        media_root: args.media_dir.clone(),
        media_public_base: args.media_public_base.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
