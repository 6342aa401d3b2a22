//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use picguard_core::Config;
use picguard_processing::{UploadPipeline, UploadPolicy};

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let state = build_state(config).await?;
    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}

/// Build the shared state: upload policy, pipeline and both directories.
pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    let policy = UploadPolicy::standard().context("Failed to compile SVG rule table")?;
    let pipeline = Arc::new(UploadPipeline::new(Arc::new(policy)));

    let (store, spool) = storage::setup_storage(&config).await?;

    Ok(Arc::new(AppState {
        config,
        pipeline,
        store,
        spool,
    }))
}
