//! LLaVA backend served by a local Ollama instance.
//!
//! No authentication required, just Ollama running with the model pulled.
//! The model is checked and warmed up once per process through the shared
//! registry; later calls reuse it.

use super::backend::{model_or, Generation, ModelBackend, Task};
use super::http;
use super::registry::{local_models, LoadedModel};
use crate::config::ModelConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llava";

/// Ollama backend for LLaVA-family models.
pub struct LlavaBackend {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl LlavaBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            client: http::client(),
        }
    }

    /// Make sure `model` is pulled and resident, once per process.
    async fn ensure_loaded(&self, model: &str) -> ProviderResult<()> {
        let key = format!("llava:{}:{model}", self.endpoint);
        local_models()
            .get_or_load(&key, || self.load(model))
            .await
            .map(|_| ())
    }

    async fn load(&self, model: &str) -> ProviderResult<LoadedModel> {
        let load_error = |message: String| ProviderError::ModelLoad {
            model: model.to_string(),
            message,
        };

        let tags: TagsResponse = http::send_json(
            "llava",
            self.client
                .get(format!("{}/api/tags", self.endpoint))
                .timeout(Duration::from_secs(10)),
        )
        .await
        .map_err(|e| load_error(format!("Ollama is not reachable at {}: {e}", self.endpoint)))?;

        if !tags.has_model(model) {
            return Err(load_error(format!(
                "model not found in Ollama, run `ollama pull {model}`"
            )));
        }

        // An empty prompt makes Ollama load the weights without generating.
        let warm = GenerateRequest {
            model: model.to_string(),
            prompt: String::new(),
            system: None,
            images: Vec::new(),
            stream: false,
            options: None,
        };
        http::send_json::<GenerateResponse>(
            "llava",
            self.client
                .post(format!("{}/api/generate", self.endpoint))
                .json(&warm)
                .timeout(self.timeout),
        )
        .await
        .map_err(|e| load_error(e.to_string()))?;

        Ok(LoadedModel {
            endpoint: self.endpoint.clone(),
            model: model.to_string(),
        })
    }
}

fn request_body(model_name: &str, model: &ModelConfig, task: &Task) -> GenerateRequest {
    GenerateRequest {
        model: model_name.to_string(),
        prompt: task.user_prompt(),
        system: Some(model.system_prompt().to_string()).filter(|s| !s.is_empty()),
        images: task.image().map(|i| i.base64()).into_iter().collect(),
        stream: false,
        options: Some(GenerateOptions {
            temperature: model.temperature(),
            num_predict: model.max_tokens(),
        }),
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

impl GenerateResponse {
    fn tokens_used(&self) -> Option<u32> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        }
    }
}

/// Ollama /api/tags response.
#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl TagsResponse {
    /// `llava` matches `llava:latest`; a tagged name must match exactly.
    fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| {
            m.name == model || (!model.contains(':') && m.name == format!("{model}:latest"))
        })
    }
}

#[async_trait]
impl ModelBackend for LlavaBackend {
    fn name(&self) -> &str {
        "llava"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
        let model_name = model_or(model, DEFAULT_MODEL);
        self.ensure_loaded(model_name).await?;

        let start = Instant::now();
        let request = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request_body(model_name, model, task))
            .timeout(self.timeout);
        let resp: GenerateResponse = http::send_json("llava", request).await?;

        Ok(Generation {
            text: http::non_empty("llava", &resp.response)?,
            model: model_name.to_string(),
            tokens_used: resp.tokens_used(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
