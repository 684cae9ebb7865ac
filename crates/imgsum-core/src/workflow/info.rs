//! Introspection record returned by [`ImageSummarizer::get_info`](super::ImageSummarizer::get_info).

use serde::{Deserialize, Serialize};

/// Placeholder model name when provider settings cannot be looked up.
pub const CONFIGURATION_ERROR: &str = "Configuration Error";

/// Which providers and models a summarizer is wired to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerInfo {
    /// Configured default provider
    pub provider: String,
    pub image_provider: String,
    pub text_provider: String,
    pub image_model: String,
    pub text_model: String,
    /// Workflow section of the config, including unrecognised keys
    pub workflow_settings: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationFlags>,
    /// Set when provider settings could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flags derived from how the two roles are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationFlags {
    /// Both roles use the same provider
    pub single_provider: bool,
    /// Both roles use the same model identifier
    pub models_shared: bool,
    /// Same provider and same model, so one loaded model serves both roles
    pub memory_efficient: bool,
}

impl OptimizationFlags {
    pub fn new(image_provider: &str, text_provider: &str, image_model: &str, text_model: &str) -> Self {
        let single_provider = image_provider == text_provider;
        let models_shared = image_model == text_model;
        Self {
            single_provider,
            models_shared,
            memory_efficient: single_provider && models_shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = OptimizationFlags::new("llava", "llava", "llava", "llava");
        assert!(flags.single_provider && flags.models_shared && flags.memory_efficient);

        let flags = OptimizationFlags::new("openai", "openai", "gpt-4o", "gpt-4o-mini");
        assert!(flags.single_provider);
        assert!(!flags.models_shared);
        assert!(!flags.memory_efficient);

        let flags = OptimizationFlags::new("llava", "falcon", "m", "m");
        assert!(!flags.single_provider);
        assert!(flags.models_shared);
        assert!(!flags.memory_efficient);
    }
}
