//! imgsum core - describe a batch of images and summarize them.
//!
//! A batch of image paths goes through a pluggable vision backend, one
//! description per image, and the successful descriptions go through a
//! pluggable text backend that writes one consolidated summary.
//!
//! # Architecture
//!
//! ```text
//! paths → validate → batches → ImageDescriber → descriptions → TextSummarizer → SummaryResult
//! ```
//!
//! Backends (Bedrock, Azure OpenAI, OpenAI, local LLaVA via Ollama, local
//! Falcon/BLIP via an inference server) are chosen by name from the config.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgsum_core::{Config, ImageSummarizer};
//!
//! #[tokio::main]
//! async fn main() -> imgsum_core::Result<()> {
//!     let config = Config::load()?;
//!     let summarizer = ImageSummarizer::new(config)?;
//!
//!     let paths = vec!["./beach.jpg".to_string(), "./sunset.png".to_string()];
//!     let result = summarizer.process_images(&paths).await;
//!     println!("{}", result.summary);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod types;
pub mod workflow;

// Re-exports for convenient access
pub use config::{Config, ModelConfig, ProviderConfig};
pub use error::{ConfigError, ProviderError, ProviderResult, Result, SummarizerError};
pub use output::{OutputFormat, OutputWriter};
pub use provider::{ImageDescriber, ProviderFactory, ProviderKind, TextSummarizer};
pub use types::{ImageDescription, Metadata, SummaryResult};
pub use workflow::{ImageSummarizer, OptimizationFlags, SummarizerInfo};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
