use std::path::PathBuf;
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use skyforest_geodesy::api::{create_router, AppState};
use skyforest_geodesy::config::EngineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // optional config file as the only argument
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = EngineConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    let state = AppState::from_config(&config).context("failed to initialize engine")?;

    let app = create_router(state, config.body_limit);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    info!(address = %config.bind_address, "skyforest-geodesy API listening");
    info!("GET  /api/crs/:id");
    info!("GET  /api/crs/compound?horizontal=<id>&vertical=<id>");
    info!("GET  /api/shift?latitude=<lat>&longitude=<lon>&inverse=<bool>");
    info!("POST /api/shift/batch (multipart/form-data: csv file, optional inverse)");
    info!("POST /api/directory (multipart/form-data: tiff file)");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
