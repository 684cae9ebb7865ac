//! The `imgsum summarize` command.

use super::types::{OutputFormat, Provider};
use clap::Args;
use imgsum_core::output::OutputWriter;
use imgsum_core::{Config, ConfigError, ImageSummarizer, ProviderKind, SummaryResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Arguments for the `summarize` command.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Image files to process
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Also save the results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `[output] format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Use this provider for both roles instead of the configured ones
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,
}

/// Execute the summarize command.
pub async fn execute(
    args: SummarizeArgs,
    loaded: Result<Config, ConfigError>,
) -> anyhow::Result<ExitCode> {
    let mut config = loaded?;
    if let Some(provider) = args.provider {
        config.override_provider(ProviderKind::from(provider).as_str());
    }
    let format = match args.format {
        Some(format) => format,
        None if config.output.format == "json" => OutputFormat::Json,
        None => OutputFormat::Text,
    };

    let summarizer = ImageSummarizer::new(config)?;

    let info = summarizer.get_info();
    eprintln!("Using provider: {}", info.provider);
    eprintln!("Image model: {}", info.image_model);
    eprintln!("Text model: {}", info.text_model);
    eprintln!("Processing {} images...\n", args.images.len());

    let spinner = create_spinner(args.images.len());
    let result = summarizer.process_images(&args.images).await;
    spinner.finish_and_clear();

    write_result(std::io::stdout().lock(), &result, format)?;

    if finish(&result, format, args.output.as_deref())? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Save the report to `output` unless the run failed. Returns `false` on failure.
fn finish(
    result: &SummaryResult,
    format: OutputFormat,
    output: Option<&Path>,
) -> std::io::Result<bool> {
    if is_failure(result, format) {
        return Ok(false);
    }
    if let Some(path) = output {
        write_result(BufWriter::new(File::create(path)?), result, format)?;
        eprintln!("\nResults saved to: {}", path.display());
    }
    Ok(true)
}

fn write_result<W: Write>(
    writer: W,
    result: &SummaryResult,
    format: OutputFormat,
) -> std::io::Result<()> {
    let mut writer = OutputWriter::new(writer, format.into());
    writer.write(result)?;
    writer.flush()
}

/// Text reports of failed runs exit non-zero; JSON always carries the error.
fn is_failure(result: &SummaryResult, format: OutputFormat) -> bool {
    format == OutputFormat::Text && result.error_message.is_some()
}

fn create_spinner(total: usize) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Describing and summarizing {total} images"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
