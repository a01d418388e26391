//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Transform failures are logged and carry the underlying message to the
//! caller as a single 500 response.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plate_core::TransformError;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// All errors that can occur in the plate-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// One or more request fields failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The body was not acceptable JSON (malformed, wrong type, too large).
    #[error("bad request: {0}")]
    Json(#[from] JsonRejection),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Generator, recode or file-write failure during a transform.
    #[error("Image transformation failed: {0}")]
    Transform(#[from] TransformError),
}

/// Flatten validator output into `{field: [message, ...]}`.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(m) => m.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation failed", "fields": field_messages(errors) }),
            ),
            ServerError::Json(rejection) => (rejection.status(), json!({ "error": rejection.body_text() })),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),

            ServerError::Transform(e) => {
                error!(error = %e, "image transformation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": self.to_string() }))
            }
        };
        (status, Json(body)).into_response()
    }
}
