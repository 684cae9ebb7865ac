//! Provider contract and backends.
//!
//! Two capability traits, [`ImageDescriber`] and [`TextSummarizer`], are all
//! the workflow sees. Concrete services (Bedrock, Azure OpenAI, OpenAI, and
//! local LLaVA / Falcon models) implement [`backend::ModelBackend`] and are
//! wrapped by the adapters that turn their errors into soft failures.
//! [`ProviderFactory`] picks the backend named by configuration.

pub mod adapter;
pub mod azure;
pub mod backend;
pub mod bedrock;
mod factory;
pub mod falcon;
mod http;
pub mod llava;
pub mod openai;
pub mod registry;

pub use adapter::{BackendDescriber, BackendSummarizer};
pub use factory::ProviderFactory;
pub use registry::ModelRegistry;

use crate::error::ProviderResult;
use crate::types::ImageDescription;
use async_trait::async_trait;
use std::fmt;

/// Turns images into text descriptions.
///
/// Expected failures (missing file, API error) come back as
/// `ImageDescription { success: false, .. }`. An `Err` means something went
/// wrong that the workflow should treat as fatal for the whole call.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Provider name for logging and reports.
    fn name(&self) -> &str;

    /// Describe one image.
    async fn describe_image(&self, image_path: &str) -> ProviderResult<ImageDescription>;

    /// Describe several images, one result per path in input order.
    async fn describe_images_batch(
        &self,
        image_paths: &[String],
    ) -> ProviderResult<Vec<ImageDescription>> {
        let mut results = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            results.push(self.describe_image(path).await?);
        }
        Ok(results)
    }
}

/// Condenses descriptions into one summary.
///
/// Internal failures are reported as a human-readable string in `Ok`.
#[async_trait]
pub trait TextSummarizer: Send + Sync {
    /// Provider name for logging and reports.
    fn name(&self) -> &str;

    async fn summarize(&self, descriptions: &[String]) -> ProviderResult<String>;
}

/// The closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Bedrock,
    AzureOpenAi,
    OpenAi,
    Llava,
    Falcon,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Bedrock,
        ProviderKind::AzureOpenAi,
        ProviderKind::OpenAi,
        ProviderKind::Llava,
        ProviderKind::Falcon,
    ];

    /// Parse a provider name as written in configuration.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "bedrock",
            ProviderKind::AzureOpenAi => "azure_openai",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Llava => "llava",
            ProviderKind::Falcon => "falcon",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
