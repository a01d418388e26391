use std::time::Duration;

use thiserror::Error;

/// Errors raised while turning an uploaded photo into a stored menu image.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The generator API answered with a non-2xx status.
    #[error("generator API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The prompt or the produced image was rejected by a safety filter.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The generator answered 2xx but the body did not carry an image.
    #[error("{0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error talking to the generator.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The generator did not answer within the configured timeout.
    #[error("generator request timed out after {0:?}")]
    Timeout(Duration),

    /// Base64 payload could not be decoded.
    #[error("failed to decode base64 data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The generated image could not be re-encoded into the requested format.
    #[error("failed to recode image: {0}")]
    Recode(#[from] image::ImageError),

    /// Writing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TransformError {
    /// Returns `true` if the failure is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
