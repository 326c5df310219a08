//! Identity Gateway Binary
//!
//! Runs the HTTP server that cross-matches Cognito and Shopify identities.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use identity_gateway::{create_router, AppState, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let log_level = env::var("IDENTITY_GATEWAY_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = GatewayConfig::from_env()?;

    info!(
        region = %config.cognito.region,
        user_pool = %config.cognito.user_pool_id,
        shop = %config.shopify.shop_domain,
        port = config.port,
        "Starting identity gateway"
    );

    let bridge = config.build_bridge()?;
    let state = Arc::new(AppState::new(bridge, config.request_timeout));
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, "Identity gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Identity gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed
        std::future::pending::<()>().await;
    }
}
