//! Describer and summarizer implementations on top of a [`ModelBackend`].
//!
//! This is where backend errors become soft failure records: a missing file,
//! an unreadable image, or a failed API call never escapes as an error.

use super::backend::{Generation, ImageInput, ModelBackend, Task};
use super::{ImageDescriber, TextSummarizer};
use crate::config::ModelConfig;
use crate::error::ProviderResult;
use crate::types::ImageDescription;
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;

/// Image describer backed by one model on one backend.
pub struct BackendDescriber {
    backend: Arc<dyn ModelBackend>,
    model: ModelConfig,
    concurrency: usize,
}

impl BackendDescriber {
    /// `concurrency` bounds in-flight requests within one batch; 1 is sequential.
    pub fn new(backend: Arc<dyn ModelBackend>, model: ModelConfig, concurrency: usize) -> Self {
        Self {
            backend,
            model,
            concurrency: concurrency.max(1),
        }
    }

    fn success(&self, image_path: &str, generation: Generation) -> ImageDescription {
        let metadata = generation.metadata(self.backend.name(), self.backend.is_local());
        ImageDescription::success(image_path, generation.text, Some(metadata))
    }
}

#[async_trait]
impl ImageDescriber for BackendDescriber {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn describe_image(&self, image_path: &str) -> ProviderResult<ImageDescription> {
        let path = Path::new(image_path);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(ImageDescription::not_found(image_path));
        }

        let image = match ImageInput::read(path).await {
            Ok(image) => image,
            Err(e) => {
                return Ok(ImageDescription::failure(
                    image_path,
                    format!("Failed to read image: {e}"),
                ));
            }
        };

        match self.backend.generate(&self.model, &Task::Describe(image)).await {
            Ok(generation) => Ok(self.success(image_path, generation)),
            Err(e) => {
                tracing::warn!("{} failed to describe {image_path}: {e}", self.name());
                Ok(ImageDescription::failure(
                    image_path,
                    format!("Error describing image: {e}"),
                ))
            }
        }
    }

    async fn describe_images_batch(
        &self,
        image_paths: &[String],
    ) -> ProviderResult<Vec<ImageDescription>> {
        describe_buffered(self, image_paths, self.concurrency).await
    }
}

/// Describe paths with at most `limit` requests in flight.
///
/// Results come back in input order regardless of completion order.
pub async fn describe_buffered<D>(
    describer: &D,
    image_paths: &[String],
    limit: usize,
) -> ProviderResult<Vec<ImageDescription>>
where
    D: ImageDescriber + ?Sized,
{
    let pending: Vec<_> = image_paths
        .iter()
        .map(|path| describer.describe_image(path))
        .collect();
    futures_util::stream::iter(pending)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

/// Text summarizer backed by one model on one backend.
pub struct BackendSummarizer {
    backend: Arc<dyn ModelBackend>,
    model: ModelConfig,
}

impl BackendSummarizer {
    pub fn new(backend: Arc<dyn ModelBackend>, model: ModelConfig) -> Self {
        Self { backend, model }
    }
}

#[async_trait]
impl TextSummarizer for BackendSummarizer {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn summarize(&self, descriptions: &[String]) -> ProviderResult<String> {
        let task = Task::summarize(descriptions);
        match self.backend.generate(&self.model, &task).await {
            Ok(generation) => Ok(generation.text),
            Err(e) => {
                tracing::warn!("{} failed to summarize: {e}", self.name());
                Ok(format!("Error creating summary: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend that echoes the prompt, or fails, and records what it saw.
    struct EchoBackend {
        fail: bool,
        calls: AtomicU32,
        in_flight: AtomicU32,
        max_in_flight: AtomicU32,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoBackend {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicU32::new(0),
                in_flight: AtomicU32::new(0),
                max_in_flight: AtomicU32::new(0),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(task.user_prompt());

            if self.fail {
                return Err(ProviderError::Request {
                    provider: "echo".to_string(),
                    message: "HTTP 500".to_string(),
                    status_code: Some(500),
                });
            }
            let text = match task {
                Task::Describe(image) => format!("{} bytes", image.bytes.len()),
                Task::Summarize(combined) => combined.clone(),
            };
            Ok(Generation {
                text,
                model: model.model_name().to_string(),
                tokens_used: Some(7),
                latency_ms: 1,
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    fn model() -> ModelConfig {
        ModelConfig::new("echo-1", 100, 0.2, "be brief").unwrap()
    }

    fn write_image(dir: &tempfile::TempDir, name: &str, len: usize) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![0u8; len]).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_describe_success_carries_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "a.jpg", 5);
        let describer = BackendDescriber::new(Arc::new(EchoBackend::new(false)), model(), 1);

        let desc = describer.describe_image(&path).await.unwrap();
        assert!(desc.success);
        assert_eq!(desc.description, "5 bytes");
        let metadata = desc.metadata.unwrap();
        assert_eq!(metadata["model"], "echo-1");
        assert_eq!(metadata["provider"], "echo");
    }

    #[tokio::test]
    async fn test_describe_missing_file_is_soft_failure() {
        let backend = Arc::new(EchoBackend::new(false));
        let describer = BackendDescriber::new(backend.clone(), model(), 1);

        let desc = describer.describe_image("/nonexistent/x.jpg").await.unwrap();
        assert!(!desc.success);
        assert_eq!(
            desc.error_message.as_deref(),
            Some("Image file not found: /nonexistent/x.jpg")
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_describe_backend_error_is_soft_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "a.jpg", 1);
        let describer = BackendDescriber::new(Arc::new(EchoBackend::new(true)), model(), 1);

        let desc = describer.describe_image(&path).await.unwrap();
        assert!(!desc.success);
        assert!(desc
            .error_message
            .unwrap()
            .starts_with("Error describing image: echo request failed"));
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_one_entry_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_image(&dir, "a.jpg", 1),
            "/nonexistent/b.jpg".to_string(),
            write_image(&dir, "c.jpg", 3),
        ];
        let describer = BackendDescriber::new(Arc::new(EchoBackend::new(false)), model(), 2);

        let results = describer.describe_images_batch(&paths).await.unwrap();
        let returned: Vec<_> = results.iter().map(|r| r.image_path.clone()).collect();
        assert_eq!(returned, paths);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[2].description, "3 bytes");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_concurrency_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6)
            .map(|i| write_image(&dir, &format!("{i}.jpg"), i + 1))
            .collect();
        let mut backend = EchoBackend::new(false);
        backend.delay = Duration::from_millis(50);
        let backend = Arc::new(backend);
        let describer = BackendDescriber::new(backend.clone(), model(), 2);

        let results = describer.describe_images_batch(&paths).await.unwrap();
        assert_eq!(results.len(), 6);
        assert_eq!(results[5].description, "6 bytes");
        assert!(backend.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_runs_on_spawned_task_through_trait_object() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..4)
            .map(|i| write_image(&dir, &format!("{i}.jpg"), i + 1))
            .collect();
        let describer: Arc<dyn ImageDescriber> =
            Arc::new(BackendDescriber::new(Arc::new(EchoBackend::new(false)), model(), 3));

        let batch = paths.clone();
        let results = tokio::spawn(async move { describer.describe_images_batch(&batch).await })
            .await
            .unwrap()
            .unwrap();
        let descriptions: Vec<_> = results.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, ["1 bytes", "2 bytes", "3 bytes", "4 bytes"]);
    }

    #[tokio::test]
    async fn test_summarize_passes_numbered_descriptions() {
        let backend = Arc::new(EchoBackend::new(false));
        let summarizer = BackendSummarizer::new(backend.clone(), model());

        let summary = summarizer
            .summarize(&["red car".to_string(), "blue boat".to_string()])
            .await
            .unwrap();
        assert_eq!(summary, "Image 1: red car\n\nImage 2: blue boat");
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("comprehensive summary"));
    }

    #[tokio::test]
    async fn test_summarize_failure_returns_error_text() {
        let summarizer = BackendSummarizer::new(Arc::new(EchoBackend::new(true)), model());
        let summary = summarizer.summarize(&["x".to_string()]).await.unwrap();
        assert!(summary.starts_with("Error creating summary:"));
    }
}
