//! Hub policy service
//!
//! Runs next to the hub and answers profile and culling policy queries
//! over HTTP.

use anyhow::{Context, Result};
use hub_lib::{
    health::HealthRegistry,
    observability::{PolicyMetrics, StructuredLogger},
    HubConfig,
};
use hub_policyd::api::{self, AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "hub-policyd";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting {}", SERVICE_NAME);

    let config = HubConfig::load(None).context("Failed to load hub configuration")?;
    let catalog = config.catalog().context("Failed to load profile catalog")?;
    info!(
        profiles = catalog.len(),
        admins = config.admin.users.len(),
        auth_configured = config.auth.is_some(),
        "Policy configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = PolicyMetrics::new();
    let logger = StructuredLogger::new(SERVICE_NAME);

    let state = Arc::new(AppState::new(
        &config,
        catalog,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));
    state.record_component_health().await;
    health_registry.set_ready(true).await;

    logger.log_startup(SERVICE_VERSION, state.catalog.len(), config.server.listen_port);

    let shutdown = {
        let logger = logger.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            logger.log_shutdown("SIGINT received");
        }
    };

    api::serve(config.server.listen_port, state, shutdown).await?;
    info!("Shut down");

    Ok(())
}
