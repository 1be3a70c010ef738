use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use staybook_core::{Marketplace, StaybookConfig};
use staybook_server::{AppState, build_router, singleton, tasks};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staybook=info,tower_http=info".into()),
        )
        .init();

    let config = StaybookConfig::load().context("Failed to load config")?;
    let data_dir = config.data_path();

    // Ensure only one instance owns the data directory
    let _lock = singleton::acquire_lock(&data_dir)?;

    let market = Arc::new(
        Marketplace::from_config(&config)
            .await
            .context("Failed to open the data directory")?,
    );

    if config.server.admin_token.is_none() {
        tracing::warn!("no server.admin_token configured; admin endpoints are disabled");
    }
    if config.server.webhook_secret.is_none() {
        tracing::warn!("no server.webhook_secret configured; payment webhooks will be rejected");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh = tasks::spawn_refresh(
        market.clone(),
        config.availability.refresh_interval,
        shutdown_rx.clone(),
    );
    let expiry = tasks::spawn_expiry(market.clone(), tasks::EXPIRY_SWEEP, shutdown_rx);

    let state = AppState::new(
        market,
        config.server.admin_token.clone(),
        config.server.webhook_secret.clone(),
    );
    let app = build_router(state);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(data_dir = %data_dir.display(), "staybook-server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(refresh, expiry);

    Ok(())
}
