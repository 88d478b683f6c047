use docchat::api::{create_router, AppState};
use docchat::infrastructure::{config::DEFAULT_CONFIG_PATH, AppConfig};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    docchat::telemetry::init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = AppConfig::load(&config_path)?;
    info!(path = %config_path, "configuration loaded");

    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );

    let state = AppState::from_config(config).await?;
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
