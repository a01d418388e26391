use crate::state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    // Parse the configured origin list and build a restrictive layer.
    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %s, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        // Wildcard: only when no usable origin was configured.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(Any)
            .allow_methods(Any)
    }
}
