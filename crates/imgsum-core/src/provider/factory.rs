//! Builds describers and summarizers from configuration.

use super::adapter::{BackendDescriber, BackendSummarizer};
use super::azure::{self, AzureOpenAiBackend};
use super::backend::ModelBackend;
use super::bedrock::{self, BedrockBackend};
use super::falcon::{self, FalconBackend};
use super::http::timeout_from;
use super::llava::{self, LlavaBackend};
use super::openai::OpenAiBackend;
use super::{ImageDescriber, ProviderKind, TextSummarizer};
use crate::config::{Config, ModelRole, ProviderConfig};
use crate::error::ConfigError;
use std::sync::Arc;
use std::time::Duration;

const CLOUD_TIMEOUT: Duration = Duration::from_secs(60);
const LOCAL_TIMEOUT: Duration = Duration::from_secs(120);

/// Constructs providers by name from a resolved [`Config`].
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the image describer for `provider`.
    pub fn create_image_describer(
        provider: &str,
        config: &Config,
    ) -> Result<Arc<dyn ImageDescriber>, ConfigError> {
        let (kind, settings) = Self::resolve(provider, config)?;
        let backend = build_backend(kind, settings, ModelRole::Image)?;
        let concurrency = settings
            .setting_u64("max_concurrent_requests")
            .map_or(1, |n| n.max(1) as usize);
        tracing::info!(
            "Image describer: {kind} ({}), concurrency {concurrency}, timeout {}s",
            settings.image_model.model_name(),
            backend.timeout().as_secs()
        );
        Ok(Arc::new(BackendDescriber::new(
            backend,
            settings.image_model.clone(),
            concurrency,
        )))
    }

    /// Build the text summarizer for `provider`.
    pub fn create_text_summarizer(
        provider: &str,
        config: &Config,
    ) -> Result<Arc<dyn TextSummarizer>, ConfigError> {
        let (kind, settings) = Self::resolve(provider, config)?;
        let backend = build_backend(kind, settings, ModelRole::Text)?;
        tracing::info!(
            "Text summarizer: {kind} ({}), timeout {}s",
            settings.text_model.model_name(),
            backend.timeout().as_secs()
        );
        Ok(Arc::new(BackendSummarizer::new(
            backend,
            settings.text_model.clone(),
        )))
    }

    fn resolve<'a>(
        provider: &str,
        config: &'a Config,
    ) -> Result<(ProviderKind, &'a ProviderConfig), ConfigError> {
        let kind = ProviderKind::parse(provider)
            .ok_or_else(|| ConfigError::UnknownProvider(provider.to_string()))?;
        Ok((kind, config.provider(kind.as_str())?))
    }
}

fn build_backend(
    kind: ProviderKind,
    settings: &ProviderConfig,
    role: ModelRole,
) -> Result<Arc<dyn ModelBackend>, ConfigError> {
    let name = kind.as_str();
    let timeout = |default| timeout_from(settings.setting_u64("timeout_seconds"), default);

    let backend: Arc<dyn ModelBackend> = match kind {
        ProviderKind::OpenAi => {
            let api_key = settings.required_str(name, "api_key")?;
            let backend = OpenAiBackend::new(api_key, timeout(CLOUD_TIMEOUT));
            match settings.setting_str("endpoint") {
                Some(endpoint) => Arc::new(backend.with_endpoint(endpoint)),
                None => Arc::new(backend),
            }
        }
        ProviderKind::AzureOpenAi => {
            let endpoint = settings.required_str(name, "endpoint")?;
            let api_key = settings.required_str(name, "api_key")?;
            let deployment = settings.model(role).model_name();
            if deployment.is_empty() {
                return Err(ConfigError::MissingSetting {
                    provider: name.to_string(),
                    key: "deployment_name".to_string(),
                });
            }
            let api_version = settings
                .setting_str("api_version")
                .unwrap_or(azure::DEFAULT_API_VERSION);
            Arc::new(AzureOpenAiBackend::new(
                endpoint,
                deployment,
                api_version,
                api_key,
                timeout(CLOUD_TIMEOUT),
            ))
        }
        ProviderKind::Bedrock => {
            let api_key = settings
                .required_str(name, "api_key")
                .map(str::to_string)
                .or_else(|e| bedrock_token_from_env().ok_or(e))?;
            let region = settings
                .setting_str("aws_region")
                .unwrap_or(bedrock::DEFAULT_REGION);
            let backend = BedrockBackend::new(region, &api_key, timeout(CLOUD_TIMEOUT));
            match settings.setting_str("endpoint") {
                Some(endpoint) => Arc::new(backend.with_base_url(endpoint)),
                None => Arc::new(backend),
            }
        }
        ProviderKind::Llava => {
            let endpoint = settings
                .setting_str("endpoint")
                .unwrap_or(llava::DEFAULT_ENDPOINT);
            Arc::new(LlavaBackend::new(endpoint, timeout(LOCAL_TIMEOUT)))
        }
        ProviderKind::Falcon => {
            let endpoint = settings
                .setting_str("endpoint")
                .unwrap_or(falcon::DEFAULT_ENDPOINT);
            let token = settings.optional_str("api_token");
            Arc::new(FalconBackend::new(endpoint, token, timeout(LOCAL_TIMEOUT)))
        }
    };
    Ok(backend)
}

fn bedrock_token_from_env() -> Option<String> {
    std::env::var("AWS_BEARER_TOKEN_BEDROCK")
        .ok()
        .filter(|v| !v.is_empty())
}
