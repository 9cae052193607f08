//! Restaurant Directory Server
//!
//! Loads configuration from the environment, opens the configured store and
//! serves the REST API until interrupted.

use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;

use restaurant_directory::{
    api::{build_router, AppState, API_PREFIX},
    config::{env, AppConfig},
    service::{DisabledMailer, EmailService, LocalPhotoStore, MapQuestGeocoder, Mailer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // RUST_LOG wins over LOG_LEVEL
    let log_level = env::get_string("LOG_LEVEL", "info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!(
        "🚀 Starting Restaurant Directory v{}",
        restaurant_directory::VERSION
    );

    let config = AppConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    log::info!(
        "✅ Configuration loaded ({} environment)",
        config.server.environment
    );

    let store = config
        .database
        .open_store()
        .await
        .context("failed to open the store")?;

    let geocoder = MapQuestGeocoder::new(&config.geocoder, config.upstream_timeout)?;
    if config.geocoder.api_key.is_empty() {
        log::warn!("⚠️  GEOCODER_API_KEY is not set; geocoding requests will fail");
    }

    let mailer: Arc<dyn Mailer> = match &config.email {
        Some(email_config) => {
            log::info!("✅ SMTP delivery via {}", email_config.smtp_host);
            Arc::new(EmailService::new(email_config.clone())?)
        }
        None => {
            log::warn!("⚠️  SMTP is not configured; password reset emails are disabled");
            Arc::new(DisabledMailer)
        }
    };

    let photos = LocalPhotoStore::new(config.upload.path.clone());
    log::info!("📁 Photos are stored in {}", config.upload.path.display());

    let state = AppState::new(
        &config,
        store,
        Arc::new(geocoder),
        mailer,
        Arc::new(photos),
    )?;
    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    log::info!("🌐 Listening on {} (API under {})", bind_addr, API_PREFIX);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
