//! The generative-image capability behind the transform endpoint.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::mime::ImageMime;

pub use gemini::{GeminiGenerator, GeminiGeneratorBuilder};

/// Something that turns a source image plus a prompt into a new image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the raw bytes of the generated image.
    async fn transform(&self, image: &[u8], mime: ImageMime, prompt: &str) -> Result<Vec<u8>>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Retry helper for generators; only transient failures are retried.
#[async_trait]
pub trait ImageGeneratorExt: ImageGenerator {
    async fn transform_with_retries(
        &self,
        image: &[u8],
        mime: ImageMime,
        prompt: &str,
        max_retries: u32,
    ) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.transform(image, mime, prompt).await {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    let delay = Duration::from_secs(1u64 << attempt.min(4));
                    warn!(
                        generator = self.name(),
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient generator error"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

impl<T: ImageGenerator + ?Sized> ImageGeneratorExt for T {}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::TransformError;

    struct Flaky {
        calls: AtomicU32,
        fail_times: u32,
        status: u16,
    }

    #[async_trait]
    impl ImageGenerator for Flaky {
        async fn transform(&self, _: &[u8], _: ImageMime, _: &str) -> Result<Vec<u8>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(TransformError::Api { status: self.status, message: "nope".into() })
            } else {
                Ok(vec![1, 2, 3])
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors() {
        let g = Flaky { calls: AtomicU32::new(0), fail_times: 2, status: 503 };
        let out = g.transform_with_retries(b"x", ImageMime::Jpeg, "p", 3).await.unwrap();
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(g.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_is_a_single_call() {
        let g = Flaky { calls: AtomicU32::new(0), fail_times: 1, status: 503 };
        assert!(g.transform_with_retries(b"x", ImageMime::Jpeg, "p", 0).await.is_err());
        assert_eq!(g.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let g = Flaky { calls: AtomicU32::new(0), fail_times: 5, status: 400 };
        assert!(g.transform_with_retries(b"x", ImageMime::Jpeg, "p", 3).await.is_err());
        assert_eq!(g.calls.load(Ordering::SeqCst), 1);
    }
}
