//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Origins allowed when `PLATE_CORS_ORIGINS` is unset (local frontend dev servers).
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Runtime configuration for plate-server.
///
/// Everything except the Gemini credential has a default.
#[derive(Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Gemini API key (`GEMINI_API_KEY`, required).
    pub gemini_api_key: String,

    /// Gemini model identifier.
    pub gemini_model: String,

    /// Gemini API origin.
    pub gemini_base_url: String,

    /// Timeout for a single generator call.
    pub upstream_timeout: Duration,

    /// Retries after a transient generator failure (default `0`).
    pub upstream_retries: u32,

    /// Directory generated images are written to (default: `"uploads"`).
    pub upload_dir: PathBuf,

    /// Origin used to build the URL returned to clients.
    pub public_base_url: String,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,

    /// Request body limit in bytes.
    pub max_body_bytes: usize,

    /// Re-encode generator output into the requested format.
    pub recode_output: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("upstream_retries", &self.upstream_retries)
            .field("upload_dir", &self.upload_dir)
            .field("public_base_url", &self.public_base_url)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("recode_output", &self.recode_output)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("enable_swagger", &self.enable_swagger)
            .finish()
    }
}

impl Config {
    /// Build [`Config`] from the process environment.
    ///
    /// Fails only when `GEMINI_API_KEY` is missing or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let gemini_api_key = match lookup("GEMINI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!("GEMINI_API_KEY is not configured"),
        };

        Ok(Self {
            bind_address: env_or("PLATE_BIND", "0.0.0.0:3000"),
            gemini_api_key,
            gemini_model: env_or("PLATE_GEMINI_MODEL", plate_core::generator::gemini::DEFAULT_MODEL),
            gemini_base_url: env_or("PLATE_GEMINI_BASE_URL", plate_core::generator::gemini::DEFAULT_BASE_URL),
            upstream_timeout: Duration::from_secs(parse_or(&lookup, "PLATE_UPSTREAM_TIMEOUT_SECS", 120)),
            upstream_retries: parse_or(&lookup, "PLATE_UPSTREAM_RETRIES", 0),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            public_base_url: env_or("PLATE_PUBLIC_URL", "http://localhost:3000"),
            cors_allowed_origins: parse_origins(&env_or("PLATE_CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            max_body_bytes: parse_or(&lookup, "PLATE_MAX_BODY_MB", 50usize) * 1024 * 1024,
            recode_output: flag("PLATE_RECODE_OUTPUT", true),
            log_level: env_or("PLATE_LOG", "info"),
            log_json: flag("PLATE_LOG_JSON", false),
            enable_swagger: flag("PLATE_ENABLE_SWAGGER", true),
        })
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
