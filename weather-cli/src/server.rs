use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use weather_relay_core::{Config, WeatherRelay};

use crate::api::{self, AppState};

/// Build the relay from config and serve until Ctrl+C or SIGTERM.
pub async fn serve(cfg: Config) -> Result<()> {
    let relay = WeatherRelay::openweather(cfg.relay_settings()?)?;
    let app = api::router(AppState { relay });

    let addr = (cfg.server.host.as_str(), cfg.server.port);
    let listener = TcpListener::bind(addr).await.with_context(|| {
        format!("Failed to bind {}:{}", cfg.server.host, cfg.server.port)
    })?;

    tracing::info!(
        addr = %listener.local_addr()?,
        upstream = %cfg.upstream.base_url,
        timeout_secs = cfg.upstream.timeout_secs,
        "Weather relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Weather relay stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    tokio::select! {
        _ = wait_ctrl_c() => {},
        _ = wait_sigterm() => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

async fn wait_ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(%e, "Error handling Ctrl+C signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_sigterm() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut handler) => {
            handler.recv().await;
        }
        Err(e) => {
            tracing::error!(%e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_sigterm() {
    std::future::pending::<()>().await
}
