//! plate-core: turn a food photo into a menu-ready image.
//!
//! The pipeline lives in [`transform::Transformer`]; it talks to the outside
//! world through the [`generator::ImageGenerator`] capability and writes its
//! output through [`storage::UploadStore`].

pub mod error;
pub mod generator;
pub mod mime;
pub mod recode;
pub mod storage;
pub mod transform;
pub mod types;

pub use error::{Result, TransformError};
pub use generator::{GeminiGenerator, ImageGenerator};
pub use mime::ImageMime;
pub use storage::UploadStore;
pub use transform::{Transformer, TransformerOptions, UPLOADS_ROUTE};
pub use types::{
    OutputFormat, Quality, TransformImageRequest, TransformImageResponse, TransformJob,
    TransformMetadata, DEFAULT_PROMPT,
};
