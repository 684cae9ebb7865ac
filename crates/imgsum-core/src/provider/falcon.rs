//! Local captioning and summarization models behind an inference server
//! speaking the Hugging Face Inference API protocol (text-generation-inference,
//! a self-hosted inference endpoint, or the hosted API).
//!
//! Images are captioned by an image-to-text model (BLIP by default) and
//! descriptions are condensed by a summarization model (Falconsai by default).
//! Each model is warmed up once per process through the shared registry.

use super::backend::{model_or, Generation, ModelBackend, Task};
use super::http;
use super::registry::{local_models, LoadedModel};
use crate::config::ModelConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_IMAGE_MODEL: &str = "Salesforce/blip-image-captioning-base";
pub const DEFAULT_TEXT_MODEL: &str = "Falconsai/text_summarization";

/// Summarization input is cut to this many characters.
const MAX_SUMMARY_INPUT_CHARS: usize = 1024;
const MIN_SUMMARY_LENGTH: u32 = 50;

/// 1x1 transparent PNG used to warm up captioning models.
const WARMUP_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Inference-server backend for captioning and summarization models.
pub struct FalconBackend {
    endpoint: String,
    api_token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl FalconBackend {
    pub fn new(endpoint: &str, api_token: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token: api_token.map(str::to_string),
            timeout,
            client: http::client(),
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{model}", self.endpoint)
    }

    fn post(&self, model: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(self.model_url(model)).timeout(self.timeout);
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn ensure_loaded(&self, model: &str, captioning: bool) -> ProviderResult<()> {
        let key = format!("falcon:{}:{model}", self.endpoint);
        local_models()
            .get_or_load(&key, || self.load(model, captioning))
            .await
            .map(|_| ())
    }

    /// Ask the server to load the model and wait until it can answer.
    async fn load(&self, model: &str, captioning: bool) -> ProviderResult<LoadedModel> {
        let request = self.post(model).header("x-wait-for-model", "true");
        let request = if captioning {
            request.body(WARMUP_PNG.to_vec())
        } else {
            request.json(&summary_body("warm up", MIN_SUMMARY_LENGTH))
        };

        http::send_json::<serde_json::Value>("falcon", request)
            .await
            .map_err(|e| ProviderError::ModelLoad {
                model: model.to_string(),
                message: e.to_string(),
            })?;

        Ok(LoadedModel {
            endpoint: self.endpoint.clone(),
            model: model.to_string(),
        })
    }

    async fn caption(&self, model: &str, bytes: &[u8]) -> ProviderResult<String> {
        let outputs: Vec<CaptionOutput> =
            http::send_json("falcon", self.post(model).body(bytes.to_vec())).await?;
        first_text("falcon", outputs.into_iter().map(|o| o.generated_text))
    }

    async fn summarize(&self, model: &str, combined: &str, max_length: u32) -> ProviderResult<String> {
        let outputs: Vec<SummaryOutput> =
            http::send_json("falcon", self.post(model).json(&summary_body(combined, max_length)))
                .await?;
        first_text("falcon", outputs.into_iter().map(|o| o.summary_text))
    }
}

fn first_text(provider: &str, mut texts: impl Iterator<Item = String>) -> ProviderResult<String> {
    let text = texts.next().ok_or_else(|| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        message: "empty output list".to_string(),
    })?;
    http::non_empty(provider, &text)
}

/// Cut text to the model's input limit on a char boundary.
fn truncate_input(text: &str) -> String {
    match text.char_indices().nth(MAX_SUMMARY_INPUT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn summary_body(text: &str, max_length: u32) -> SummaryRequest {
    SummaryRequest {
        inputs: truncate_input(text),
        parameters: SummaryParameters {
            max_length,
            min_length: MIN_SUMMARY_LENGTH.min(max_length),
            do_sample: false,
        },
    }
}

#[derive(Serialize)]
struct SummaryRequest {
    inputs: String,
    parameters: SummaryParameters,
}

#[derive(Serialize)]
struct SummaryParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct CaptionOutput {
    generated_text: String,
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[async_trait]
impl ModelBackend for FalconBackend {
    fn name(&self) -> &str {
        "falcon"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
        let start = Instant::now();
        let (model_name, text) = match task {
            Task::Describe(image) => {
                let name = model_or(model, DEFAULT_IMAGE_MODEL);
                self.ensure_loaded(name, true).await?;
                (name, self.caption(name, &image.bytes).await?)
            }
            Task::Summarize(combined) => {
                let name = model_or(model, DEFAULT_TEXT_MODEL);
                self.ensure_loaded(name, false).await?;
                (name, self.summarize(name, combined, model.max_tokens()).await?)
            }
        };

        Ok(Generation {
            text,
            model: model_name.to_string(),
            tokens_used: None,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
