//! The `imgsum config` command for configuration management.

use clap::{Args, Subcommand};
use imgsum_core::{Config, ConfigError};
use std::path::Path;
use std::process::ExitCode;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(
    args: ConfigArgs,
    path: &Path,
    loaded: Result<Config, ConfigError>,
) -> anyhow::Result<ExitCode> {
    match args.command {
        ConfigCommand::Show => {
            let config = loaded?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => write_default(path, force)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = Config::default().to_toml()?;
    std::fs::write(path, toml)?;

    tracing::info!("Config file created at: {}", path.display());
    println!("Configuration initialized at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default(&path, false).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.workflow.batch_size, 3);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_provider = \"llava\"\n").unwrap();

        let err = write_default(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));

        write_default(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().default_provider, "openai");
    }
}
