//! Azure OpenAI backend.
//!
//! Azure speaks the Chat Completions format but addresses models by
//! deployment in the URL and authenticates with an `api-key` header, so this
//! delegates to [`OpenAiBackend`] with a per-deployment endpoint.

use super::backend::{Generation, ModelBackend, Task};
use super::openai::{AuthHeader, OpenAiBackend};
use crate::config::ModelConfig;
use crate::error::ProviderResult;
use async_trait::async_trait;
use std::time::Duration;

/// Default REST API version sent as `api-version`.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Azure OpenAI backend bound to one deployment.
pub struct AzureOpenAiBackend {
    inner: OpenAiBackend,
}

impl AzureOpenAiBackend {
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Self {
        let url = deployment_url(endpoint, deployment, api_version);
        Self {
            inner: OpenAiBackend::compatible(
                "azure_openai",
                api_key,
                &url,
                AuthHeader::ApiKey,
                timeout,
            ),
        }
    }
}

fn deployment_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

#[async_trait]
impl ModelBackend for AzureOpenAiBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, model: &ModelConfig, task: &Task) -> ProviderResult<Generation> {
        self.inner.generate(model, task).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_url() {
        let backend = AzureOpenAiBackend::new(
            "https://contoso.openai.azure.com/",
            "gpt-4-vision",
            DEFAULT_API_VERSION,
            "key",
            Duration::from_secs(60),
        );
        assert_eq!(
            deployment_url(
                "https://contoso.openai.azure.com/",
                "gpt-4-vision",
                DEFAULT_API_VERSION
            ),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4-vision/chat/completions?api-version=2024-02-15-preview"
        );
        assert_eq!(backend.name(), "azure_openai");
    }
}
