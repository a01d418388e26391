//! The transform pipeline: sniff → generate → recode → store → describe.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::generator::{ImageGenerator, ImageGeneratorExt};
use crate::mime::ImageMime;
use crate::recode;
use crate::storage::UploadStore;
use crate::types::{TransformImageResponse, TransformJob, TransformMetadata};

/// URL path under which the upload directory is served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Knobs for [`Transformer`].
#[derive(Debug, Clone)]
pub struct TransformerOptions {
    /// Origin prepended to file paths to build the returned URL.
    pub public_base_url: String,
    /// Re-encode output whose signature differs from the requested format.
    pub recode_output: bool,
    /// Extra attempts after a transient generator failure.
    pub max_retries: u32,
}

impl Default for TransformerOptions {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_owned(),
            recode_output: true,
            max_retries: 0,
        }
    }
}

/// Runs one transform per call. Holds no per-request state, so a single
/// instance is shared by every handler.
#[derive(Clone)]
pub struct Transformer {
    generator: Arc<dyn ImageGenerator>,
    store: UploadStore,
    options: TransformerOptions,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("generator", &self.generator.name())
            .field("store", &self.store)
            .field("options", &self.options)
            .finish()
    }
}

impl Transformer {
    pub fn new(generator: Arc<dyn ImageGenerator>, store: UploadStore, options: TransformerOptions) -> Self {
        Self { generator, store, options }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Generate, store and describe one menu image.
    ///
    /// Nothing is written to disk unless the generator call succeeds.
    /// Failures are returned to the caller, which owns reporting them.
    pub async fn transform(&self, job: TransformJob) -> Result<TransformImageResponse> {
        let started = Instant::now();
        let TransformJob { image, prompt, quality, format } = job;
        let original_size = image.len() as u64;
        let mime = ImageMime::detect(&image);
        info!(original_size, %mime, %format, %quality, "processing image transformation");

        let generated = self
            .generator
            .transform_with_retries(&image, mime, &prompt, self.options.max_retries)
            .await?;
        info!(generator = self.generator.name(), bytes = generated.len(), "received transformed image");

        let output = if self.options.recode_output {
            tokio::task::spawn_blocking(move || recode::recode(generated, format, quality)).await??
        } else {
            generated
        };

        let stored = self.store.save(&output, format).await?;
        let file_path = format!("{UPLOADS_ROUTE}/{}", stored.file_name);
        let url = format!("{}{file_path}", self.options.public_base_url.trim_end_matches('/'));
        let processing_time_ms = started.elapsed().as_millis() as u64;

        info!(path = %stored.path.display(), processing_time_ms, "image transformation completed");

        Ok(TransformImageResponse {
            success: true,
            file_path,
            url,
            metadata: TransformMetadata {
                original_size,
                transformed_size: stored.size,
                format,
                quality,
                prompt,
                processing_time_ms,
            },
        })
    }
}
