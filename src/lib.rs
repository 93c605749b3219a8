pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod kakao;
pub mod media;
pub mod personality;
pub mod shelter;

use api::create_api_router;
use auth::AuthService;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use kakao::{KakaoClient, KakaoConfig};
use media::{FileStore, MediaStore};
use shelter::{ShelterClient, ShelterConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access credentials
    pub jwt_secret: Vec<u8>,
    /// Access-credential lifetime in seconds (minutes-scale)
    pub access_ttl_secs: u64,
    /// Refresh-session lifetime in seconds (days-scale)
    pub refresh_ttl_secs: u64,
    /// Identity-provider endpoints and client credentials
    pub kakao: KakaoConfig,
    /// Public stray-animal API endpoint and service key
    pub shelter: ShelterConfig,
    /// Directory for uploaded profile images
    pub media_root: PathBuf,
    /// URL prefix the media directory is served under
    pub media_public_base: String,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret, config.access_ttl_secs));
    let kakao = Arc::new(KakaoClient::new(config.kakao.clone()));
    let shelter_client = Arc::new(ShelterClient::new(config.shelter.clone()));

    let media: Arc<dyn MediaStore> = Arc::new(
        FileStore::open(&config.media_root, &config.media_public_base)
            .expect("Failed to initialize media store"),
    );

    let auth_service = Arc::new(AuthService::new(
        config.db.clone(),
        jwt.clone(),
        kakao,
        config.refresh_ttl_secs,
    ));

    create_api_router(config.db.clone(), jwt, auth_service, shelter_client, media)
}

/// Run cleanup tasks and spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    init_cleanup(&config.db).await;

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
