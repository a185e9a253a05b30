//! jotter-api - HTTP API server for jotter

use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use jotter_api::{config::ServerConfig, router, telemetry, AppState};
use jotter_crypto::{SecretBox, TokenSigner};
use jotter_db::{Database, PoolConfig};
use jotter_inference::InferenceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let log_settings = telemetry::LogSettings::from_env();
    let _file_guard = telemetry::init(&log_settings);
    info!(
        log_format = if log_settings.json { "json" } else { "text" },
        log_file = log_settings.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if config.rate_limit.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.rate_limit.requests,
        config.rate_limit.period.as_secs()
    );

    let secrets = SecretBox::new(&config.encryption_key).context("invalid ENCRYPTION_KEY")?;
    let tokens = TokenSigner::new(&config.jwt_secret, config.jwt_expires_in_secs)
        .context("invalid JWT_SECRET")?;

    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env(), secrets)
        .await?;
    db.migrate().await?;
    info!("Database connected");

    let processor = InferenceConfig::from_env().build_processor()?;

    let state = AppState::new(db, processor, tokens, config.rate_limit);
    let app = router(state, config.allowed_origins.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
