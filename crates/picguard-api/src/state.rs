use std::sync::Arc;

use picguard_core::Config;
use picguard_processing::{UploadPipeline, UploadPolicy};
use picguard_storage::{SpoolDir, UploadStore};

/// Shared, read-only application state.
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<UploadPipeline>,
    pub store: UploadStore,
    pub spool: SpoolDir,
}

impl AppState {
    pub fn policy(&self) -> &UploadPolicy {
        self.pipeline.policy()
    }
}
