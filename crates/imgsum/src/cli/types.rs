//! CLI enum types: output format and provider override.

use clap::ValueEnum;
use imgsum_core::{OutputFormat as CoreOutputFormat, ProviderKind};

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Human-readable report
    Text,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Text => CoreOutputFormat::Text,
        }
    }
}

/// Supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// AWS Bedrock (Claude)
    Bedrock,
    /// Azure OpenAI deployment
    #[value(name = "azure_openai")]
    AzureOpenai,
    /// OpenAI API
    Openai,
    /// Local LLaVA via Ollama
    Llava,
    /// Local captioning and summarization models
    Falcon,
}

impl From<Provider> for ProviderKind {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Bedrock => ProviderKind::Bedrock,
            Provider::AzureOpenai => ProviderKind::AzureOpenAi,
            Provider::Openai => ProviderKind::OpenAi,
            Provider::Llava => ProviderKind::Llava,
            Provider::Falcon => ProviderKind::Falcon,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(ProviderKind::from(*self).as_str())
    }
}
