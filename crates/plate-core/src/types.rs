//! Wire types for the transform endpoint.
//!
//! Shared by the server (request parsing, OpenAPI docs) and the CLI client.
//! Field names are camelCase on the wire.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::mime::ImageMime;

/// Prompt used when the caller does not supply one.
pub const DEFAULT_PROMPT: &str = "extract the food out and turn it into a great production studio food photography for a restaurant menu";

/// Requested output quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

impl Quality {
    /// Encoder quality used when the output has to be re-encoded as JPEG.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::Low => 60,
            Self::Medium => 80,
            Self::High => 92,
        }
    }
}

/// Requested output container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn mime(&self) -> ImageMime {
        match self {
            Self::Jpeg => ImageMime::Jpeg,
            Self::Png => ImageMime::Png,
            Self::Webp => ImageMime::Webp,
        }
    }
}

/// Request body for `POST /images/transform`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TransformImageRequest {
    /// Base64-encoded source photo (no data-URL prefix).
    #[validate(length(min = 1, message = "image must not be empty"))]
    pub image: String,
    /// Instruction for the generator; defaults to a studio food-photography prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: Option<String>,
    /// Output quality (default `high`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    /// Output format (default `jpeg`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

/// A validated request with defaults applied and the image decoded.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub image: Vec<u8>,
    pub prompt: String,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl TransformImageRequest {
    /// Validate every field and decode the image.
    ///
    /// All field problems are reported together, keyed by field name.
    pub fn into_job(self) -> Result<TransformJob, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        let encoded = self.image.trim();
        let image = if encoded.is_empty() {
            // A zero-length string is already reported by the length rule.
            if !self.image.is_empty() {
                errors.add(
                    "image",
                    ValidationError::new("length").with_message("image must not be empty".into()),
                );
            }
            Vec::new()
        } else {
            match base64::engine::general_purpose::STANDARD.decode(encoded) {
                Ok(bytes) => bytes,
                Err(e) => {
                    errors.add(
                        "image",
                        ValidationError::new("base64")
                            .with_message(format!("image must be valid base64: {e}").into()),
                    );
                    Vec::new()
                }
            }
        };

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(TransformJob {
            image,
            prompt: self.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_owned()),
            quality: self.quality.unwrap_or_default(),
            format: self.format.unwrap_or_default(),
        })
    }
}

/// Details about a completed transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransformMetadata {
    /// Decoded byte length of the uploaded image.
    pub original_size: u64,
    /// Byte length of the stored output.
    pub transformed_size: u64,
    pub format: OutputFormat,
    pub quality: Quality,
    pub prompt: String,
    /// Wall-clock duration of the whole operation.
    pub processing_time_ms: u64,
}

/// Response body for a successful `POST /images/transform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransformImageResponse {
    pub success: bool,
    /// Server-relative path, e.g. `/uploads/menu-photo-….png`.
    pub file_path: String,
    /// Fully qualified URL of the stored image.
    pub url: String,
    pub metadata: TransformMetadata,
}
