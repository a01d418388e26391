//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection, body limit)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `PLATE_ENABLE_SWAGGER=false`)
//! - Health / readiness route
//! - The image transform route
//! - Static serving of generated images under `/uploads`

pub mod doc;
mod health;
mod images;

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::{middleware, Router};
use plate_core::UPLOADS_ROUTE;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ServerError;
use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(health::router())
        .merge(images::router())
        .nest_service(UPLOADS_ROUTE, ServeDir::new(state.transformer.store().root()));

    let mut app = Router::new().merge(api_router).fallback(not_found);

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(format!("no route for {}", uri.path()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use axum::Router;
    use plate_core::{ImageGenerator, ImageMime, TransformError};

    use crate::config::Config;
    use crate::state::AppState;

    /// Generator for tests that never reach the transform route.
    pub struct Idle;

    #[async_trait::async_trait]
    impl ImageGenerator for Idle {
        async fn transform(&self, _: &[u8], _: ImageMime, _: &str) -> plate_core::Result<Vec<u8>> {
            Err(TransformError::UnexpectedResponse("idle generator".into()))
        }

        fn name(&self) -> &str {
            "idle"
        }
    }

    /// Router wired to `generator`, writing into `dir`.
    pub async fn app(generator: Arc<dyn ImageGenerator>, dir: &Path, extra: &[(&str, &str)]) -> Router {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("GEMINI_API_KEY".to_owned(), "test-key".to_owned()),
            ("UPLOAD_DIR".to_owned(), dir.display().to_string()),
        ]);
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let state = AppState::build(config, generator).await.unwrap();
        super::build(Arc::new(state))
    }
}
