//! Bring generator output into the container format the caller asked for.
//!
//! The generator is free to answer in any encoding. When the returned bytes
//! already carry the requested signature they are passed through untouched;
//! otherwise they are decoded and re-encoded.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::Result;
use crate::mime::ImageMime;
use crate::types::{OutputFormat, Quality};

/// Returns `true` when `bytes` already look like `format`.
pub fn matches_format(bytes: &[u8], format: OutputFormat) -> bool {
    ImageMime::sniff(bytes) == Some(format.mime())
}

/// Re-encode `bytes` into `format` unless they are already in it.
pub fn recode(bytes: Vec<u8>, format: OutputFormat, quality: Quality) -> Result<Vec<u8>> {
    if matches_format(&bytes, format) {
        return Ok(bytes);
    }

    let img = image::load_from_memory(&bytes)?;
    debug!(
        from = ?ImageMime::sniff(&bytes),
        to = %format,
        width = img.width(),
        height = img.height(),
        "recoding generated image"
    );

    let mut out = Cursor::new(Vec::with_capacity(bytes.len()));
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.jpeg_quality()))?;
        }
        OutputFormat::Png => img.write_to(&mut out, ImageFormat::Png)?,
        OutputFormat::Webp => {
            // The bundled WebP encoder is lossless and takes RGB(A)8 only.
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut out, ImageFormat::WebP)?
        }
    }
    Ok(out.into_inner())
}
