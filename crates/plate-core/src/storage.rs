//! On-disk store for generated images.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::types::OutputFormat;

/// Prefix shared by every generated file name.
pub const FILE_PREFIX: &str = "menu-photo";

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Bare file name, e.g. `menu-photo-1718000000000-<uuid>.png`.
    pub file_name: String,
    /// Absolute or cwd-relative location on disk.
    pub path: PathBuf,
    pub size: u64,
}

/// Handle to the upload directory.
///
/// Only obtainable through [`UploadStore::init`], so holding one means the
/// directory exists.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create `root` (and parents) if needed. Safe to call repeatedly.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(path = %root.display(), "upload directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `menu-photo-<unix millis>-<uuid v4>.<ext>`
    pub fn generate_file_name(format: OutputFormat) -> String {
        format!(
            "{FILE_PREFIX}-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            format.extension()
        )
    }

    /// Write `bytes` under a fresh unique name.
    pub async fn save(&self, bytes: &[u8], format: OutputFormat) -> Result<StoredImage> {
        let file_name = Self::generate_file_name(format);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(StoredImage {
            file_name,
            path,
            size: bytes.len() as u64,
        })
    }
}
