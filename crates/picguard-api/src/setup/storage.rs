//! Upload and spool directory setup

use anyhow::{Context, Result};
use picguard_core::Config;
use picguard_storage::{SpoolDir, UploadStore};

/// Create both directories if absent.
pub async fn setup_storage(config: &Config) -> Result<(UploadStore, SpoolDir)> {
    let store = UploadStore::new(config.upload_dir(), config.public_prefix())
        .await
        .context("Failed to initialize upload directory")?;

    let spool = SpoolDir::new(config.spool_dir())
        .await
        .context("Failed to initialize spool directory")?;

    tracing::info!(
        upload_dir = %store.base_path().display(),
        spool_dir = %spool.path().display(),
        public_prefix = %config.public_prefix(),
        "Upload storage initialized"
    );

    Ok((store, spool))
}
