//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;
use crate::provider::ProviderKind;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// Model limits are already enforced when provider tables are parsed.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.workflow.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.batch_size must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"text\", got \"{}\"",
                self.output.format
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        for name in self.providers.keys() {
            if ProviderKind::parse(name).is_none() {
                tracing::warn!("Ignoring config section for unknown provider '{name}'");
            }
        }
        Ok(())
    }
}
