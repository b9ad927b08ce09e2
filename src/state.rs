// Shared, read-only state handed to every request handler
use std::path::PathBuf;
use std::sync::Arc;

use crate::registry::ModelRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(registry: ModelRegistry, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(registry),
            upload_dir: upload_dir.into(),
        }
    }
}
