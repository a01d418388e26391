//! Image transform route.
//!
//! Accepts a base64 photo plus options, runs it through the shared
//! [`plate_core::Transformer`] and answers with the stored file's location.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use plate_core::{OutputFormat, Quality, TransformImageRequest, TransformImageResponse, TransformMetadata};
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(transform_image),
    components(schemas(TransformImageRequest, TransformImageResponse, TransformMetadata, Quality, OutputFormat))
)]
pub struct ImagesApi;

/// Register image routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/images/transform", post(transform_image))
}

/// Menu-photo transform (`POST /images/transform`).
///
/// Decodes the image, sends it with the prompt to the generator, stores the
/// result under the upload directory and returns its path, URL and metadata.
#[utoipa::path(
    post,
    path = "/images/transform",
    tag = "images",
    request_body = TransformImageRequest,
    responses(
        (status = 200, description = "Transformed image stored", body = TransformImageResponse),
        (status = 400, description = "Validation failed"),
        (status = 413, description = "Body exceeds the configured limit"),
        (status = 422, description = "Malformed JSON or unknown enum value"),
        (status = 500, description = "Image transformation failed"),
    )
)]
pub async fn transform_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransformImageRequest>, JsonRejection>,
) -> Result<Json<TransformImageResponse>, ServerError> {
    let Json(req) = payload?;
    debug!(
        image_b64_len = req.image.len(),
        quality = ?req.quality,
        format = ?req.format,
        "transform request"
    );

    let job = req.into_job()?;
    let response = state.transformer.transform(job).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use plate_core::{ImageGenerator, ImageMime, TransformError, DEFAULT_PROMPT};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use crate::routes::test_support::app;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];
    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 9, 9, 9];

    struct Stub {
        reply: &'static [u8],
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(reply: &'static [u8]) -> Arc<Self> {
            Arc::new(Self { reply, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl ImageGenerator for Stub {
        async fn transform(&self, _image: &[u8], _mime: ImageMime, _prompt: &str) -> plate_core::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_vec())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct Empty;

    #[async_trait]
    impl ImageGenerator for Empty {
        async fn transform(&self, _: &[u8], _: ImageMime, _: &str) -> plate_core::Result<Vec<u8>> {
            Err(TransformError::UnexpectedResponse("No image generated from Gemini API".into()))
        }

        fn name(&self) -> &str {
            "empty"
        }
    }

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::post("/images/transform")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn stored_path(dir: &Path, file_path: &str) -> std::path::PathBuf {
        dir.join(file_path.trim_start_matches("/uploads/"))
    }

    #[tokio::test]
    async fn jpeg_to_png_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Stub::new(PNG_BYTES);
        let router = app(generator.clone(), dir.path(), &[]).await;

        let mut jpeg = vec![0u8; 10 * 1024];
        jpeg[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);

        let resp = router
            .clone()
            .oneshot(post_json(json!({ "image": b64(&jpeg), "quality": "high", "format": "png" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["metadata"]["format"], "png");
        assert_eq!(body["metadata"]["quality"], "high");
        assert_eq!(body["metadata"]["originalSize"], 10240);
        assert_eq!(body["metadata"]["transformedSize"], PNG_BYTES.len());

        let file_path = body["filePath"].as_str().unwrap();
        assert_eq!(body["url"], format!("http://localhost:3000{file_path}"));
        assert_eq!(std::fs::read(stored_path(dir.path(), file_path)).unwrap(), PNG_BYTES);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        // The returned path is served back by the static route.
        let fetched = router
            .oneshot(Request::get(file_path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        let bytes = fetched.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], PNG_BYTES);
    }

    #[tokio::test]
    async fn omitted_options_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(Stub::new(JPEG_BYTES), dir.path(), &[]).await;

        let resp = router.oneshot(post_json(json!({ "image": b64(b"raw") }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["metadata"]["prompt"], DEFAULT_PROMPT);
        assert_eq!(body["metadata"]["quality"], "high");
        assert_eq!(body["metadata"]["format"], "jpeg");
        assert_eq!(body["metadata"]["originalSize"], 3);
        assert!(body["filePath"].as_str().unwrap().ends_with(".jpeg"));
    }

    #[tokio::test]
    #[traced_test]
    async fn generator_failure_is_500_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(Arc::new(Empty), dir.path(), &[]).await;

        let resp = router.oneshot(post_json(json!({ "image": b64(JPEG_BYTES) }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "Image transformation failed: No image generated from Gemini API"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains("image transformation failed")).count() {
                1 => Ok(()),
                n => Err(format!("expected one failure log line, found {n}")),
            }
        });
    }

    #[tokio::test]
    async fn whitespace_image_is_rejected_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Stub::new(PNG_BYTES);
        let router = app(generator.clone(), dir.path(), &[]).await;

        let resp = router.oneshot(post_json(json!({ "image": "   " }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["fields"]["image"][0], "image must not be empty");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn png_output_is_stored_as_default_jpeg() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(16, 16)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let png: &'static [u8] = png.into_inner().leak();

        let dir = tempfile::tempdir().unwrap();
        let router = app(Stub::new(png), dir.path(), &[]).await;

        let resp = router.oneshot(post_json(json!({ "image": b64(JPEG_BYTES) }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["metadata"]["format"], "jpeg");

        let file_path = body["filePath"].as_str().unwrap();
        assert!(file_path.ends_with(".jpeg"));
        let written = std::fs::read(stored_path(dir.path(), file_path)).unwrap();
        assert_eq!(&written[..3], &[0xFF, 0xD8, 0xFF]);
        assert_ne!(written, png);
        assert_eq!(body["metadata"]["transformedSize"], written.len());
    }

    #[tokio::test]
    async fn invalid_base64_is_rejected_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Stub::new(PNG_BYTES);
        let router = app(generator.clone(), dir.path(), &[]).await;

        let resp = router
            .oneshot(post_json(json!({ "image": "%%% not base64 %%%" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["fields"]["image"][0].as_str().unwrap().contains("base64"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_image_and_bad_enum_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Stub::new(PNG_BYTES);
        let router = app(generator.clone(), dir.path(), &[]).await;

        let resp = router.clone().oneshot(post_json(json!({ "prompt": "x" }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(resp).await["error"].as_str().unwrap().contains("image"));

        let resp = router
            .oneshot(post_json(json!({ "image": b64(JPEG_BYTES), "format": "bmp" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(resp).await["error"].as_str().unwrap().contains("format"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(Stub::new(PNG_BYTES), dir.path(), &[("PLATE_MAX_BODY_MB", "1")]).await;

        let big = vec![0xFFu8; 1024 * 1024];
        let resp = router.oneshot(post_json(json!({ "image": b64(&big) }))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn concurrent_requests_write_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(Stub::new(PNG_BYTES), dir.path(), &[]).await;

        let req = || post_json(json!({ "image": b64(JPEG_BYTES), "format": "png" }));
        let (a, b) = futures::join!(router.clone().oneshot(req()), router.clone().oneshot(req()));
        let a = json_body(a.unwrap()).await;
        let b = json_body(b.unwrap()).await;

        assert_ne!(a["filePath"], b["filePath"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
