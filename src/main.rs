//! # Digital Eye API Main Entry Point
//!
//! This is the main entry point for the Digital Eye operations API service.

use anyhow::Context;
use digital_eye::{
    config::ConfigLoader, db,
    identity::build_identity_provider,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    telemetry::init_tracing(&config).context("Failed to initialize tracing")?;
    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None)
        .await
        .context("Failed to apply database migrations")?;

    let identity =
        build_identity_provider(&config).context("Failed to configure identity provider")?;

    run_server(config, db, identity).await
}
