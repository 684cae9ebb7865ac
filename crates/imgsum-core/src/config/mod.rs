//! Configuration management for imgsum.
//!
//! Configuration is a TOML file. Loading parses it into a value tree,
//! resolves `${ENV_VAR}` references once, then deserializes and validates
//! the typed view. Invalid model settings fail the load immediately.

pub mod env;
mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure for imgsum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider backing both roles unless `providers_config` says otherwise
    pub default_provider: String,

    /// Workflow settings
    pub workflow: WorkflowConfig,

    /// Optional per-role provider routing
    #[serde(skip_serializing_if = "CrossProviderConfig::is_empty")]
    pub providers_config: CrossProviderConfig,

    /// Per-provider model settings, keyed by provider name
    #[serde(deserialize_with = "types::deserialize_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert("openai".to_string(), ProviderConfig::default());
        Self {
            default_provider: "openai".to_string(),
            workflow: WorkflowConfig::default(),
            providers_config: CrossProviderConfig::default(),
            providers,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse, interpolate, and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let expanded = env::interpolate(toml::Value::Table(table));
        let config: Config = expanded.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.imgsum.imgsum/config.toml
    /// - Linux: ~/.config/imgsum/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\imgsum\imgsum\config\config.toml
    ///
    /// Falls back to ~/.imgsum/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "imgsum", "imgsum")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let expanded = shellexpand::tilde("~/.imgsum/config.toml");
                PathBuf::from(expanded.into_owned())
            })
    }

    /// Provider used for image descriptions.
    pub fn image_provider(&self) -> &str {
        self.providers_config
            .image_provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    /// Provider used for the final summary.
    pub fn text_provider(&self) -> &str {
        self.providers_config
            .text_provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    /// Look up the settings for a provider by name.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(name)
            .ok_or_else(|| ConfigError::ProviderNotConfigured(name.to_string()))
    }

    /// Route both roles to one provider, dropping any per-role routing.
    pub fn override_provider(&mut self, name: impl Into<String>) {
        self.default_provider = name.into();
        self.providers_config = CrossProviderConfig::default();
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default_provider = "bedrock"

[workflow]
batch_size = 2
max_concurrent_requests = 1
timeout_seconds = 60

[providers.bedrock]
aws_region = "us-east-1"
api_key = "test-key"

[providers.bedrock.image_model]
model_id = "anthropic.claude-3-sonnet-20240229-v1:0"
max_tokens = 1000
temperature = 0.7
system_prompt = "Describe the image"

[providers.bedrock.text_model]
model_id = "anthropic.claude-3-haiku-20240307-v1:0"
max_tokens = 500
temperature = 0.3
system_prompt = "Summarize the descriptions"

[output]
format = "json"

[logging]
level = "debug"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.workflow.batch_size, 3);
        assert!(config.providers.contains_key("openai"));
    }

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.default_provider, "bedrock");
        assert_eq!(config.workflow.batch_size, 2);
        let bedrock = config.provider("bedrock").unwrap();
        assert_eq!(
            bedrock.image_model.model_name(),
            "anthropic.claude-3-sonnet-20240229-v1:0"
        );
        assert_eq!(bedrock.text_model.max_tokens(), 500);
        assert_eq!(bedrock.setting_str("aws_region"), Some("us-east-1"));
        assert_eq!(config.output.format, "json");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.default_provider, "bedrock");
    }

    #[test]
    fn test_role_temperature_defaults_per_provider() {
        let config = Config::from_toml_str(
            r#"
            [providers.llava]
            [providers.openai]
            "#,
        )
        .unwrap();
        let llava = config.provider("llava").unwrap();
        assert!((llava.image_model.temperature() - 0.8).abs() < f32::EPSILON);
        assert!((llava.text_model.temperature() - 0.3).abs() < f32::EPSILON);
        let openai = config.provider("openai").unwrap();
        assert!((openai.image_model.temperature() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_explicit_temperature_wins_over_provider_default() {
        let config = Config::from_toml_str(
            r#"
            [providers.llava.image_model]
            model_name = "llava"
            temperature = 0.2
            "#,
        )
        .unwrap();
        let llava = config.provider("llava").unwrap();
        assert!((llava.image_model.temperature() - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_temperature_fails_load() {
        let err = Config::from_toml_str(
            r#"
            [providers.openai.image_model]
            model_name = "gpt-4o"
            temperature = 3.5
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_env_interpolation_on_load() {
        std::env::set_var("IMGSUM_TEST_OPENAI_KEY", "sk-from-env");
        let config = Config::from_toml_str(
            r#"
            [providers.openai]
            api_key = "${IMGSUM_TEST_OPENAI_KEY}"
            other = "${IMGSUM_TEST_SURELY_UNSET}"
            "#,
        )
        .unwrap();
        let openai = config.provider("openai").unwrap();
        assert_eq!(openai.setting_str("api_key"), Some("sk-from-env"));
        assert_eq!(openai.setting_str("other"), Some("${IMGSUM_TEST_SURELY_UNSET}"));
    }

    #[test]
    fn test_cross_provider_routing() {
        let config = Config::from_toml_str(
            r#"
            default_provider = "openai"
            [providers_config]
            image_provider = "llava"
            "#,
        )
        .unwrap();
        assert_eq!(config.image_provider(), "llava");
        assert_eq!(config.text_provider(), "openai");
    }

    #[test]
    fn test_override_provider_clears_routing() {
        let mut config = Config::default();
        config.providers_config.image_provider = Some("llava".to_string());
        config.override_provider("falcon");
        assert_eq!(config.image_provider(), "falcon");
        assert_eq!(config.text_provider(), "falcon");
    }

    #[test]
    fn test_missing_provider_section() {
        let config = Config::default();
        let err = config.provider("bedrock").unwrap_err();
        assert!(matches!(err, ConfigError::ProviderNotConfigured(_)));
    }

    #[test]
    fn test_config_to_toml_round_trips() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[workflow]"));
        let reparsed = Config::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed, config);
    }
}
