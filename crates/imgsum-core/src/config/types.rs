//! Sub-configuration structs with their defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Free-form provider settings (credentials, endpoints, region).
pub type Settings = BTreeMap<String, serde_json::Value>;

/// Which side of the workflow a model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Describes individual images
    Image,
    /// Summarizes the collected descriptions
    Text,
}

impl ModelRole {
    fn default_max_tokens(self) -> i64 {
        match self {
            ModelRole::Image => 1000,
            ModelRole::Text => 500,
        }
    }

    /// LLaVA samples its descriptions a little hotter than the cloud models.
    fn default_temperature(self, provider: &str) -> f32 {
        match (self, provider) {
            (ModelRole::Image, "llava") => 0.8,
            (ModelRole::Image, _) => 0.7,
            (ModelRole::Text, _) => 0.3,
        }
    }
}

/// Settings for one model.
///
/// Fields are private so a `ModelConfig` can only exist with a positive
/// token limit and a temperature in `0.0..=2.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    model_name: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

impl ModelConfig {
    /// Build a validated model config.
    pub fn new(
        model_name: impl Into<String>,
        max_tokens: i64,
        temperature: f32,
        system_prompt: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if max_tokens <= 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be positive".into(),
            ));
        }
        let max_tokens = u32::try_from(max_tokens).map_err(|_| {
            ConfigError::ValidationError(format!("max_tokens must be at most {}", u32::MAX))
        })?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0 and 2".into(),
            ));
        }
        Ok(Self {
            model_name: model_name.into(),
            max_tokens,
            temperature,
            system_prompt: system_prompt.into(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Model table as written in the config file, before role defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawModelConfig {
    /// Bedrock calls it `model_id`, Azure calls it `deployment_name`.
    #[serde(alias = "model_id", alias = "deployment_name")]
    model_name: String,
    max_tokens: Option<i64>,
    temperature: Option<f32>,
    system_prompt: String,
}

impl RawModelConfig {
    fn into_model(self, provider: &str, role: ModelRole) -> Result<ModelConfig, ConfigError> {
        ModelConfig::new(
            self.model_name,
            self.max_tokens.unwrap_or(role.default_max_tokens()),
            self.temperature
                .unwrap_or_else(|| role.default_temperature(provider)),
            self.system_prompt,
        )
    }
}

/// Settings for one provider: a model per role plus opaque settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProviderConfig")]
pub struct ProviderConfig {
    /// Model used to describe images
    pub image_model: ModelConfig,

    /// Model used to summarize descriptions
    pub text_model: ModelConfig,

    /// Everything else in the provider's table
    #[serde(flatten)]
    pub settings: Settings,
}

#[derive(Deserialize)]
struct RawProviderConfig {
    #[serde(default)]
    image_model: RawModelConfig,
    #[serde(default)]
    text_model: RawModelConfig,
    #[serde(flatten)]
    settings: Settings,
}

impl TryFrom<RawProviderConfig> for ProviderConfig {
    type Error = ConfigError;

    fn try_from(raw: RawProviderConfig) -> Result<Self, Self::Error> {
        Self::from_raw("", raw)
    }
}

/// Deserialize the `[providers.*]` tables, applying each provider's role defaults.
pub(super) fn deserialize_providers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, ProviderConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, RawProviderConfig>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, raw)| {
            let config = ProviderConfig::from_raw(&name, raw).map_err(serde::de::Error::custom)?;
            Ok((name, config))
        })
        .collect()
}

impl ProviderConfig {
    fn from_raw(provider: &str, raw: RawProviderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            image_model: raw.image_model.into_model(provider, ModelRole::Image)?,
            text_model: raw.text_model.into_model(provider, ModelRole::Text)?,
            settings: raw.settings,
        })
    }

    /// Model config for the given role.
    pub fn model(&self, role: ModelRole) -> &ModelConfig {
        match role {
            ModelRole::Image => &self.image_model,
            ModelRole::Text => &self.text_model,
        }
    }

    /// A non-empty string setting.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// An unsigned integer setting.
    pub fn setting_u64(&self, key: &str) -> Option<u64> {
        self.settings.get(key).and_then(|v| v.as_u64())
    }

    /// A string setting that must be present and resolved.
    ///
    /// A value still shaped like `${NAME}` means the environment variable
    /// was unset at load time, which counts as missing.
    pub fn required_str(&self, provider: &str, key: &str) -> Result<&str, ConfigError> {
        self.optional_str(key)
            .ok_or_else(|| ConfigError::MissingSetting {
                provider: provider.to_string(),
                key: key.to_string(),
            })
    }

    /// A string setting that is present and resolved, if any.
    pub fn optional_str(&self, key: &str) -> Option<&str> {
        self.setting_str(key).filter(|value| !is_placeholder(value))
    }
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let mut settings = Settings::new();
        settings.insert(
            "api_key".to_string(),
            serde_json::Value::String("${OPENAI_API_KEY}".to_string()),
        );
        Self {
            image_model: ModelConfig {
                model_name: "gpt-4o".to_string(),
                max_tokens: 1000,
                temperature: 0.7,
                system_prompt: "You are an expert at describing images. Describe the \
                                subjects, setting, and notable details accurately."
                    .to_string(),
            },
            text_model: ModelConfig {
                model_name: "gpt-4o-mini".to_string(),
                max_tokens: 500,
                temperature: 0.3,
                system_prompt: "You summarize sets of image descriptions into one \
                                coherent overview of what the images show."
                    .to_string(),
            },
            settings,
        }
    }
}

/// Workflow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Number of images handed to the describer per call
    pub batch_size: usize,

    /// Any other workflow keys, reported back verbatim
    #[serde(flatten)]
    pub extra: Settings,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            extra: Settings::new(),
        }
    }
}

impl WorkflowConfig {
    /// All workflow settings as one JSON object.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map: serde_json::Map<String, serde_json::Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert("batch_size".to_string(), self.batch_size.into());
        map
    }
}

/// Optional routing of the two roles to different providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossProviderConfig {
    /// Provider used for image descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_provider: Option<String>,

    /// Provider used for the summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_provider: Option<String>,
}

impl CrossProviderConfig {
    pub fn is_empty(&self) -> bool {
        self.image_provider.is_none() && self.text_provider.is_none()
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "text")
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
