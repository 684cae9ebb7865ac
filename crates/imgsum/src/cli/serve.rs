//! The `imgsum serve` command.

use crate::server::{self, AppState};
use clap::Args;
use imgsum_core::{Config, ConfigError, ImageSummarizer};
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, loaded: Result<Config, ConfigError>) -> anyhow::Result<ExitCode> {
    let config = loaded?;
    let summarizer = ImageSummarizer::new(config)?;
    tracing::info!(
        "Starting imgsum API with provider {}",
        summarizer.config().default_provider
    );

    let state = Arc::new(AppState { summarizer });
    server::serve(state, SocketAddr::new(args.host, args.port)).await?;
    Ok(ExitCode::SUCCESS)
}
