//! AWS Bedrock backend for Anthropic Claude models.
//!
//! Calls the `InvokeModel` runtime endpoint with an Anthropic Messages body.
//! Authenticates with a Bedrock API key sent as a bearer token.

use super::backend::{Generation, ModelBackend, Task};
use super::http;
use crate::config::ModelConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_REGION: &str = "us-east-1";
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Bedrock backend for one region.
pub struct BedrockBackend {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl BedrockBackend {
    pub fn new(region: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: format!("https://bedrock-runtime.{region}.amazonaws.com"),
            timeout,
            client: http::client(),
        }
    }

    /// Override the runtime endpoint (VPC endpoints, local stubs).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `{base}/model/{model_id}/invoke` with the model id percent-encoded.
    fn invoke_url(&self, model_id: &str) -> ProviderResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| ProviderError::Request {
            provider: "bedrock".to_string(),
            message: format!("invalid endpoint {}: {e}", self.base_url),
            status_code: None,
        })?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Request {
                provider: "bedrock".to_string(),
                message: format!("endpoint {} cannot take a path", self.base_url),
                status_code: None,
            })?
            .pop_if_empty()
            .extend(["model", model_id, "invoke"]);
        Ok(url)
    }
}

fn request_body(model: &ModelConfig, task: &Task) -> InvokeRequest {
    let mut content = Vec::with_capacity(2);
    if let Some(image) = task.image() {
        content.push(ContentBlock::Image {
            source: ImageSource {
                source_type: "base64",
                media_type: image.media_type.clone(),
                data: image.base64(),
            },
        });
    }
    content.push(ContentBlock::Text {
        text: task.user_prompt(),
    });

    InvokeRequest {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: model.max_tokens(),
        temperature: model.temperature(),
        system: Some(model.system_prompt().to_string()).filter(|s| !s.is_empty()),
        messages: vec![Message {
            role: "user",
            content,
        }],
    }
}

// --- Request types ---

#[derive(Serialize)]
struct InvokeRequest {
    anthropic_version: &'static str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct InvokeResponse {
    content: Vec<ResponseContent>,
    #[serde(default)]
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl ModelBackend for BedrockBackend {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
        let start = Instant::now();
        let url = self.invoke_url(model.model_name())?;

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(&request_body(model, task))
            .timeout(self.timeout);
        let resp: InvokeResponse = http::send_json("bedrock", request).await?;

        let text = resp
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Generation {
            text: http::non_empty("bedrock", &text)?,
            model: resp.model.unwrap_or_else(|| model.model_name().to_string()),
            tokens_used: resp.usage.map(|u| u.input_tokens + u.output_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
