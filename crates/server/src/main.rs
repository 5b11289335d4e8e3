use std::future::IntoFuture;

use server::{DeploymentError, DeploymentImpl, http};
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::assets::asset_dir;

#[tokio::main]
async fn main() -> Result<(), DeploymentError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},tracking={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    // Create asset directory if it doesn't exist
    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let deployment = DeploymentImpl::new().await?;

    let (config_host, config_port) = {
        let config = deployment.config().read().await;
        (config.server.host.clone(), config.server.port)
    };

    let host = std::env::var("HOST").unwrap_or(config_host);
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(config_port);

    let app_router = http::router(deployment);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Server running on http://{host}:{actual_port}");

    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    server.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
