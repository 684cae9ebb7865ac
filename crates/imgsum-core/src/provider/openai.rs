//! OpenAI backend using the Chat Completions API.
//!
//! Images travel as a data URL in the user message content array; summaries
//! are plain text messages. A system message carries the model's prompt.

use super::backend::{Generation, ModelBackend, Task};
use super::http;
use crate::config::ModelConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// How the API key is presented to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthHeader {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>` (Azure)
    ApiKey,
}

/// OpenAI backend using Chat Completions.
pub struct OpenAiBackend {
    name: &'static str,
    api_key: String,
    endpoint: String,
    auth: AuthHeader,
    send_model: bool,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            name: "openai",
            api_key: api_key.to_string(),
            endpoint: OPENAI_ENDPOINT.to_string(),
            auth: AuthHeader::Bearer,
            send_model: true,
            timeout,
            client: http::client(),
        }
    }

    /// Point at a custom chat completions URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Used by compatible services that differ only in URL and auth.
    pub(crate) fn compatible(
        name: &'static str,
        api_key: &str,
        endpoint: &str,
        auth: AuthHeader,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            auth,
            // Azure selects the model by deployment in the URL.
            send_model: auth == AuthHeader::Bearer,
            timeout,
            client: http::client(),
        }
    }

    fn request_body(&self, model: &ModelConfig, task: &Task) -> ChatRequest {
        let user_content = match task {
            Task::Describe(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: task.user_prompt(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
            Task::Summarize(_) => MessageContent::Text(task.user_prompt()),
        };

        let mut messages = Vec::with_capacity(2);
        if !model.system_prompt().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(model.system_prompt().to_string()),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_content,
        });

        ChatRequest {
            model: self.send_model.then(|| model.model_name().to_string()),
            messages,
            max_tokens: model.max_tokens(),
            temperature: model.temperature(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
        let start = Instant::now();
        let body = self.request_body(model, task);

        let request = self.client.post(&self.endpoint).json(&body).timeout(self.timeout);
        let request = match self.auth {
            AuthHeader::Bearer => request.bearer_auth(&self.api_key),
            AuthHeader::ApiKey => request.header("api-key", &self.api_key),
        };
        let chat_resp: ChatResponse = http::send_json(self.name, request).await?;

        let content = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.name.to_string(),
                message: "empty choices array, no content generated".to_string(),
            })?;

        Ok(Generation {
            text: http::non_empty(self.name, &content)?,
            model: chat_resp
                .model
                .unwrap_or_else(|| model.model_name().to_string()),
            tokens_used: chat_resp.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
