//! imgsum CLI - describe a batch of images with an AI provider and summarize them.
//!
//! # Usage
//!
//! ```bash
//! # Summarize a few images with the configured provider
//! imgsum summarize beach.jpg sunset.png
//!
//! # JSON output to a file, forcing a provider
//! imgsum summarize *.jpg --format json --output results.json --provider llava
//!
//! # Serve the upload API
//! imgsum serve --port 5000
//!
//! # View configuration
//! imgsum config show
//! ```

use clap::{Parser, Subcommand};
use imgsum_core::{Config, ConfigError};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;
mod logging;
mod server;

/// imgsum - describe images with AI and summarize them into one report.
#[derive(Parser, Debug)]
#[command(name = "imgsum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "IMGSUM_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Describe images and summarize the descriptions
    Summarize(cli::summarize::SummarizeArgs),

    /// Serve the HTTP upload API
    Serve(cli::serve::ServeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .unwrap_or_else(Config::default_path);

    // Logging isn't initialized yet, so config problems surface once a
    // command needs the config.
    let loaded = Config::load_from(&config_path);
    match &loaded {
        Ok(config) => logging::init_from_config(config, cli.verbose, cli.json_logs),
        Err(_) => logging::init_from_config(&Config::default(), cli.verbose, cli.json_logs),
    }

    tracing::debug!("imgsum v{}", imgsum_core::VERSION);

    let outcome = match cli.command {
        Commands::Summarize(args) => cli::summarize::execute(args, loaded).await,
        Commands::Serve(args) => cli::serve::execute(args, loaded).await,
        Commands::Config(args) => cli::config::execute(args, &config_path, loaded).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            if let Some(ConfigError::NotFound(path)) = e.downcast_ref::<ConfigError>() {
                eprintln!("Configuration file not found: {}", path.display());
                eprintln!("  Create one with `imgsum config init`.");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
