//! Model backend trait and the request/response types shared by all backends.
//!
//! A backend knows how to send one generation request to one kind of
//! service. The describer and summarizer adapters turn backend results into
//! workflow records, so backends only deal in `Result`.

use crate::config::ModelConfig;
use crate::error::ProviderResult;
use crate::types::Metadata;
use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use std::time::Duration;

/// User prompt sent alongside every image.
pub const DESCRIBE_PROMPT: &str = "Please describe this image in detail.";

/// Raw image bytes plus the MIME type the APIs expect.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Undecoded file contents
    pub bytes: Vec<u8>,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a file extension.
    pub fn from_bytes(bytes: Vec<u8>, extension: &str) -> Self {
        Self {
            bytes,
            media_type: media_type_for(extension).to_string(),
        }
    }

    /// Read an image file from disk.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        Ok(Self::from_bytes(bytes, &extension))
    }

    /// Base64 encoding of the bytes.
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64())
    }
}

fn media_type_for(extension: &str) -> &'static str {
    match extension {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        other => {
            tracing::debug!("Unknown image extension '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}

/// What a backend is asked to do.
#[derive(Debug, Clone)]
pub enum Task {
    /// Describe one image
    Describe(ImageInput),
    /// Summarize already-combined description text
    Summarize(String),
}

impl Task {
    /// Build a summarize task from individual descriptions.
    pub fn summarize(descriptions: &[String]) -> Self {
        Task::Summarize(combine_descriptions(descriptions))
    }

    /// The user-facing prompt for chat-style models.
    pub fn user_prompt(&self) -> String {
        match self {
            Task::Describe(_) => DESCRIBE_PROMPT.to_string(),
            Task::Summarize(combined) => format!(
                "Please create a comprehensive summary of these image descriptions:\n\n{combined}"
            ),
        }
    }

    /// The image, if this is a describe task.
    pub fn image(&self) -> Option<&ImageInput> {
        match self {
            Task::Describe(image) => Some(image),
            Task::Summarize(_) => None,
        }
    }
}

/// Number and join descriptions as `Image 1: ...` paragraphs.
pub fn combine_descriptions(descriptions: &[String]) -> String {
    descriptions
        .iter()
        .enumerate()
        .map(|(i, desc)| format!("Image {}: {desc}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The response from a backend generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl Generation {
    /// Diagnostics recorded on a successful description.
    pub fn metadata(&self, provider: &str, local_model: bool) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("provider".to_string(), provider.into());
        metadata.insert("model".to_string(), self.model.clone().into());
        metadata.insert("latency_ms".to_string(), self.latency_ms.into());
        if let Some(tokens) = self.tokens_used {
            metadata.insert("tokens_used".to_string(), tokens.into());
        }
        if local_model {
            metadata.insert("local_model".to_string(), true.into());
        }
        metadata
    }
}

/// Trait that every service backend implements.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn ModelBackend>` for dynamic dispatch).
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider name for logging (e.g., "bedrock", "llava").
    fn name(&self) -> &str;

    /// Whether the model runs on this machine rather than a cloud API.
    fn is_local(&self) -> bool {
        false
    }

    /// Run one task against the given model.
    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation>;

    /// Per-request timeout for this backend.
    fn timeout(&self) -> Duration;
}

/// A model name, or the fallback when the config leaves it empty.
pub(crate) fn model_or<'a>(model: &'a ModelConfig, fallback: &'a str) -> &'a str {
    match model.model_name() {
        "" => fallback,
        name => name,
    }
}
