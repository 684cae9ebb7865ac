//! The describe-then-summarize workflow.
//!
//! [`ImageSummarizer`] validates paths, feeds existing ones to the describer
//! in fixed-size batches, and hands the successful descriptions to the
//! summarizer. Per-image failures are data; anything that escapes a provider
//! as an error or a panic aborts the call and is reported in the result.

mod info;

pub use info::{OptimizationFlags, SummarizerInfo, CONFIGURATION_ERROR};

use crate::config::Config;
use crate::error::{ProviderError, Result};
use crate::provider::{ImageDescriber, ProviderFactory, TextSummarizer};
use crate::types::{Metadata, SummaryResult, NO_IMAGES_PROCESSED_SUMMARY};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Orchestrates one describer and one summarizer over a list of paths.
pub struct ImageSummarizer {
    config: Config,
    image_provider: String,
    text_provider: String,
    describer: Arc<dyn ImageDescriber>,
    summarizer: Arc<dyn TextSummarizer>,
}

impl ImageSummarizer {
    /// Build providers for both roles from configuration.
    ///
    /// Fails on an unknown provider, a missing provider section, or missing
    /// credentials.
    pub fn new(config: Config) -> Result<Self> {
        let image_provider = config.image_provider().to_string();
        let text_provider = config.text_provider().to_string();
        tracing::info!("Initializing summarizer: image={image_provider}, text={text_provider}");

        let describer = ProviderFactory::create_image_describer(&image_provider, &config)?;
        let summarizer = ProviderFactory::create_text_summarizer(&text_provider, &config)?;
        Ok(Self::with_providers(config, describer, summarizer))
    }

    /// Use already-built providers. Routing names still come from `config`.
    pub fn with_providers(
        config: Config,
        describer: Arc<dyn ImageDescriber>,
        summarizer: Arc<dyn TextSummarizer>,
    ) -> Self {
        Self {
            image_provider: config.image_provider().to_string(),
            text_provider: config.text_provider().to_string(),
            config,
            describer,
            summarizer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Describe every image and summarize the results.
    ///
    /// Never fails: an unexpected provider error or panic yields a result
    /// with `error_message` set and every input listed as failed.
    pub async fn process_images(&self, image_paths: &[String]) -> SummaryResult {
        match AssertUnwindSafe(self.run(image_paths)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!("Workflow failed: {e}");
                SummaryResult::workflow_error(image_paths, e)
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("Workflow panicked: {message}");
                SummaryResult::workflow_error(image_paths, message)
            }
        }
    }

    async fn run(&self, image_paths: &[String]) -> Result<SummaryResult> {
        let mut valid = Vec::with_capacity(image_paths.len());
        let mut failed_images = Vec::new();
        for path in image_paths {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                valid.push(path.clone());
            } else {
                tracing::warn!("Image not found: {path}");
                failed_images.push(path.clone());
            }
        }

        if valid.is_empty() {
            tracing::warn!("No valid image files among {} paths", image_paths.len());
            return Ok(SummaryResult::no_valid_images(image_paths));
        }

        let batch_size = self.config.workflow.batch_size.max(1);
        let batch_count = valid.len().div_ceil(batch_size);
        let mut descriptions = Vec::with_capacity(valid.len());

        for (i, batch) in valid.chunks(batch_size).enumerate() {
            tracing::debug!("Describing batch {}/{batch_count} ({} images)", i + 1, batch.len());
            let results = self.describer.describe_images_batch(batch).await?;
            if results.len() != batch.len() {
                return Err(ProviderError::BatchMismatch {
                    expected: batch.len(),
                    actual: results.len(),
                }
                .into());
            }
            for result in results {
                if result.success {
                    descriptions.push(result);
                } else {
                    tracing::warn!(
                        "Failed to describe {}: {}",
                        result.image_path,
                        result.error_message.as_deref().unwrap_or("unknown error")
                    );
                    failed_images.push(result.image_path);
                }
            }
        }

        let summary = if descriptions.is_empty() {
            NO_IMAGES_PROCESSED_SUMMARY.to_string()
        } else {
            let texts: Vec<String> = descriptions.iter().map(|d| d.description.clone()).collect();
            tracing::debug!("Summarizing {} descriptions", texts.len());
            self.summarizer.summarize(&texts).await?
        };

        tracing::info!(
            "Processed {}/{} images",
            descriptions.len(),
            image_paths.len()
        );

        Ok(SummaryResult {
            summary,
            successful_descriptions: descriptions.len(),
            descriptions,
            total_images: image_paths.len(),
            failed_images,
            error_message: None,
            metadata: Some(self.result_metadata(batch_size)),
        })
    }

    fn result_metadata(&self, batch_size: usize) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            "provider".to_string(),
            self.config.default_provider.clone().into(),
        );
        metadata.insert("batch_size".to_string(), batch_size.into());
        metadata.insert("image_provider".to_string(), self.image_provider.clone().into());
        metadata.insert("text_provider".to_string(), self.text_provider.clone().into());
        metadata
    }

    /// Report providers, models, and workflow settings.
    ///
    /// Falls back to a record with `error` set when either provider has no
    /// settings in the config.
    pub fn get_info(&self) -> SummarizerInfo {
        let workflow_settings = self.config.workflow.to_map();
        let models = self
            .config
            .provider(&self.image_provider)
            .and_then(|image| Ok((image, self.config.provider(&self.text_provider)?)));

        match models {
            Ok((image, text)) => {
                let image_model = image.image_model.model_name().to_string();
                let text_model = text.text_model.model_name().to_string();
                SummarizerInfo {
                    provider: self.config.default_provider.clone(),
                    image_provider: self.image_provider.clone(),
                    text_provider: self.text_provider.clone(),
                    optimization: Some(OptimizationFlags::new(
                        &self.image_provider,
                        &self.text_provider,
                        &image_model,
                        &text_model,
                    )),
                    image_model,
                    text_model,
                    workflow_settings,
                    error: None,
                }
            }
            Err(e) => SummarizerInfo {
                provider: self.config.default_provider.clone(),
                image_provider: self.image_provider.clone(),
                text_provider: self.text_provider.clone(),
                image_model: CONFIGURATION_ERROR.to_string(),
                text_model: CONFIGURATION_ERROR.to_string(),
                workflow_settings,
                optimization: None,
                error: Some(format!("Provider configuration error: {e}")),
            },
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in provider".to_string()
    }
}
