//! Readiness endpoint.
//!
//! Reports whether the upload directory is still usable and which generator
//! backs the transform route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health), components(schemas(HealthResponse)))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when generated images cannot be stored.
    pub status: String,
    pub version: String,
    pub generator: String,
    pub model: String,
    pub upload_dir_ready: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Ready to transform images", body = HealthResponse),
        (status = 503, description = "Upload directory missing", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let upload_dir_ready = tokio::fs::metadata(state.transformer.store().root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let status = if upload_dir_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if upload_dir_ready { "ok" } else { "degraded" }.to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        generator: state.transformer.generator_name().to_owned(),
        model: state.config.gemini_model.clone(),
        upload_dir_ready,
    };
    (status, Json(body))
}
