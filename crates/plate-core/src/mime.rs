//! Magic-byte sniffing for uploaded and generated images.

use strum::{AsRefStr, Display};

/// Image container types recognised by their leading signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum ImageMime {
    #[strum(serialize = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    Png,
    #[strum(serialize = "image/gif")]
    Gif,
    #[strum(serialize = "image/webp")]
    Webp,
}

impl ImageMime {
    /// Classify `bytes` by signature, returning `None` when nothing matches.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, 0x50, 0x4E, 0x47, ..] => Some(Self::Png),
            [0x47, 0x49, 0x46, ..] => Some(Self::Gif),
            // Only the "RIFF" container prefix is checked.
            [0x52, 0x49, 0x46, 0x46, ..] => Some(Self::Webp),
            _ => None,
        }
    }

    /// Like [`ImageMime::sniff`], falling back to JPEG for unknown data.
    pub fn detect(bytes: &[u8]) -> Self {
        Self::sniff(bytes).unwrap_or(Self::Jpeg)
    }

    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}
