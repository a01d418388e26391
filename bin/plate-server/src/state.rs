//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use plate_core::{ImageGenerator, Transformer, TransformerOptions, UploadStore};

use crate::config::Config;

/// State shared across all HTTP handlers. Read-only after startup.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Transform pipeline bound to the generator and the upload directory.
    pub transformer: Transformer,
}

impl AppState {
    /// Prepare the upload directory and wire `generator` into the pipeline.
    pub async fn build(config: Config, generator: Arc<dyn ImageGenerator>) -> plate_core::Result<Self> {
        let store = UploadStore::init(&config.upload_dir).await?;
        let transformer = Transformer::new(
            generator,
            store,
            TransformerOptions {
                public_base_url: config.public_base_url.clone(),
                recode_output: config.recode_output,
                max_retries: config.upstream_retries,
            },
        );
        Ok(Self { config: Arc::new(config), transformer })
    }
}
