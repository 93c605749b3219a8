use clap::Parser;
use pawhub::cli::{
    Args, build_config, init_logging, load_jwt_secret, open_database, validate_endpoint,
};
use pawhub::{create_app, init_cleanup};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(kakao_token_url) = validate_endpoint("kakao-token-url", &args.kakao_token_url) else {
        std::process::exit(1);
    };
    let Some(kakao_userinfo_url) =
        validate_endpoint("kakao-userinfo-url", &args.kakao_userinfo_url)
    else {
        std::process::exit(1);
    };
    let Some(shelter_api_url) = validate_endpoint("shelter-api-url", &args.shelter_api_url) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to get local address");
        std::process::exit(1);
    });

    let config = build_config(
        &args,
        db,
        jwt_secret,
        kakao_token_url,
        kakao_userinfo_url,
        shelter_api_url,
    );

    init_cleanup(&config.db).await;
    let app = create_app(&config);

    info!(address = %local_addr, "Listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
