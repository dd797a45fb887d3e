mod bot;
mod config;
mod content;
mod health;
mod platform;
mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,realpnl_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file path as the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!(
        "  Mini app: {}",
        config
            .telegram
            .mini_app_url
            .as_ref()
            .map_or("<not set>", |u| u.as_str())
    );
    info!("  Health port: {}", config.health.port);

    let config = Arc::new(config);

    // Liveness listener runs beside the dispatcher and shares only the port
    let port = config.health.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!("{:#}", e);
        }
    });

    info!("RealPNL bot is starting...");
    platform::telegram::run(config).await?;

    Ok(())
}
