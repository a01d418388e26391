//! HTTP client for a running plate-server.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use plate_core::{OutputFormat, Quality, TransformImageRequest, TransformImageResponse};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Options for a single transform call. `None` leaves the server default.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub prompt: Option<String>,
    pub quality: Option<Quality>,
    pub format: Option<OutputFormat>,
}

pub struct PlateClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlateClient {
    /// No timeout is set by default: generation can take a while and the
    /// server enforces its own upstream limit.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Read `image_path`, encode it and submit it for transformation.
    pub async fn transform_file(
        &self,
        image_path: &Path,
        options: TransformOptions,
    ) -> Result<TransformImageResponse, ClientError> {
        let bytes = tokio::fs::read(image_path).await?;
        self.transform_bytes(&bytes, options).await
    }

    pub async fn transform_bytes(
        &self,
        bytes: &[u8],
        options: TransformOptions,
    ) -> Result<TransformImageResponse, ClientError> {
        let body = TransformImageRequest {
            image: base64::engine::general_purpose::STANDARD.encode(bytes),
            prompt: options.prompt,
            quality: options.quality,
            format: options.format,
        };
        debug!(bytes = bytes.len(), "submitting transform request");

        let resp = self
            .http
            .post(format!("{}/images/transform", self.base_url))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Fetch the stored image from the URL returned by a transform.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ClientError> {
        let resp = Self::check(self.http.get(url).send().await?).await?;
        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let resp = self.http.get(format!("{}/health", self.base_url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Turn a non-2xx response into [`ClientError::Server`], preferring the
    /// server's own `error` message.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            });
        Err(ClientError::Server { status: status.as_u16(), message })
    }
}
