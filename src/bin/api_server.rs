use anyhow::{ensure, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use firemap_rasterizer::api::{create_router, AppState};
use firemap_rasterizer::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = ServerConfig::from_env();
    ensure!(
        !config.forecast_base_url.is_empty(),
        "PYRECAST_BASE_URL must be set to the forecast server base URL"
    );
    reqwest::Url::parse(&config.forecast_base_url)
        .with_context(|| format!("Invalid PYRECAST_BASE_URL: {}", config.forecast_base_url))?;
    let bind_addr = config.bind_addr;
    info!(
        bind_addr = %bind_addr,
        forecast_base_url = %config.forecast_base_url,
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        max_raster_bytes = config.max_raster_bytes,
        "Starting forecast overlay API"
    );

    let app = create_router(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("  GET /api/tif?url=<layer path>&lat=<lat>&lng=<lng>");
    info!("  GET /health");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
