//! Google Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TransformError};
use crate::generator::ImageGenerator;
use crate::mime::ImageMime;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Builder for [`GeminiGenerator`].
#[derive(Debug, Clone)]
pub struct GeminiGeneratorBuilder {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiGeneratorBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Model identifier (default: `gemini-2.5-flash-image`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// API origin; overridden in tests to point at a local mock.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Whole-request timeout for a single generate call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GeminiGenerator> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(GeminiGenerator {
            client,
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url,
            timeout: self.timeout,
        })
    }
}

/// [`ImageGenerator`] backed by the Gemini image models.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    pub fn builder(api_key: impl Into<String>) -> GeminiGeneratorBuilder {
        GeminiGeneratorBuilder::new(api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransformError {
        if e.is_timeout() {
            TransformError::Timeout(self.timeout)
        } else {
            TransformError::Network(e)
        }
    }

    fn parse_error(status: u16, text: &str) -> TransformError {
        // Gemini wraps failures as {"error": {"code", "message", "status"}}.
        let message = serde_json::from_str::<GeminiErrorEnvelope>(text)
            .map(|env| env.error.message)
            .unwrap_or_else(|_| text.trim().chars().take(500).collect());
        TransformError::Api { status, message }
    }
}

#[async_trait]
impl ImageGenerator for GeminiGenerator {
    async fn transform(&self, image: &[u8], mime: ImageMime, prompt: &str) -> Result<Vec<u8>> {
        info!(model = %self.model, prompt = %prompt, mime = %mime, "calling Gemini generateContent");

        let body = GenerateContentRequest::new(image, mime, prompt);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| self.map_send_error(e))?;
        let data = parsed.into_image_data()?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;

        debug!(bytes = bytes.len(), "received image from Gemini");
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

impl GenerateContentRequest {
    fn new(image: &[u8], mime: ImageMime, prompt: &str) -> Self {
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime.as_str().to_owned(),
                    data: base64::engine::general_purpose::STANDARD.encode(image),
                },
            },
            RequestPart::Text { text: prompt.to_owned() },
        ];
        Self {
            contents: vec![RequestContent { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_owned()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

impl GenerateContentResponse {
    /// Base64 payload of the first inline-data part of the first candidate.
    fn into_image_data(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| {
            f.block_reason
                .map(|r| f.block_reason_message.unwrap_or_else(|| format!("prompt blocked: {r}")))
        }) {
            return Err(TransformError::ContentBlocked(reason));
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            TransformError::UnexpectedResponse("No image generated from Gemini API".into())
        })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(TransformError::ContentBlocked(format!(
                    "blocked by Gemini safety filter: {reason}"
                )));
            }
        }

        let parts = candidate
            .content
            .map(|c| c.parts)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                TransformError::UnexpectedResponse("Invalid response structure from Gemini API".into())
            })?;

        parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .map(|d| d.data)
            .ok_or_else(|| TransformError::UnexpectedResponse("No image data in Gemini API response".into()))
    }
}
