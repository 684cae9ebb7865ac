//! Rendering of [`SummaryResult`] as JSON or as a plain-text report.

use crate::types::SummaryResult;
use std::io::{self, Write};
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON projection of the result
    Json,
    /// Human-readable report
    Text,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// A writer that renders summary results in the chosen format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Write one result.
    pub fn write(&mut self, result: &SummaryResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, result)
                    .map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Text => {
                write_text(&mut self.writer, result)?;
            }
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write a result as a text report.
fn write_text<W: Write>(out: &mut W, result: &SummaryResult) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "IMAGE SUMMARIZATION RESULTS")?;
    writeln!(out, "{rule}")?;

    if let Some(error) = &result.error_message {
        return writeln!(out, "Error: {error}");
    }

    writeln!(
        out,
        "Successfully processed: {}/{} images",
        result.successful_descriptions, result.total_images
    )?;

    if !result.failed_images.is_empty() {
        writeln!(out, "\nFailed images ({}):", result.failed_images.len())?;
        for path in &result.failed_images {
            writeln!(out, "  - {}", file_name(path))?;
        }
    }

    if !result.descriptions.is_empty() {
        writeln!(out, "\nIndividual Descriptions:")?;
        writeln!(out, "{}", "-".repeat(40))?;
        for (i, desc) in result.descriptions.iter().enumerate() {
            writeln!(out, "\n{}. {}:", i + 1, file_name(&desc.image_path))?;
            writeln!(out, "   {}", desc.description)?;
        }
    }

    writeln!(out, "\nFINAL SUMMARY:")?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(out, "{}", result.summary)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageDescription;

    fn sample() -> SummaryResult {
        SummaryResult {
            summary: "Two pets at home.".to_string(),
            descriptions: vec![
                ImageDescription::success("/photos/cat.jpg", "A cat on a sofa.", None),
                ImageDescription::success("/photos/dog.png", "A dog in a garden.", None),
            ],
            total_images: 3,
            successful_descriptions: 2,
            failed_images: vec!["/photos/missing.jpg".to_string()],
            error_message: None,
            metadata: None,
        }
    }

    fn render_text(result: &SummaryResult) -> String {
        let mut buffer = Vec::new();
        OutputWriter::new(&mut buffer, OutputFormat::Text)
            .write(result)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json);
        writer.write(&sample()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_images"], 3);
        assert_eq!(value["descriptions"][1]["image_path"], "/photos/dog.png");
        assert_eq!(value["failed_images"][0], "/photos/missing.jpg");
    }

    #[test]
    fn test_text_report_lists_failures_and_descriptions() {
        let text = render_text(&sample());
        assert!(text.contains("Successfully processed: 2/3 images"));
        assert!(text.contains("Failed images (1):\n  - missing.jpg"));
        assert!(text.contains("1. cat.jpg:\n   A cat on a sofa."));
        assert!(text.contains("2. dog.png:"));
        assert!(text.trim_end().ends_with("Two pets at home."));
    }

    #[test]
    fn test_text_report_stops_at_error() {
        let result = SummaryResult::workflow_error(&["a.jpg".to_string()], "boom");
        let text = render_text(&result);
        assert!(text.contains("Error: Workflow error: boom"));
        assert!(!text.contains("FINAL SUMMARY"));
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_text_write_errors_propagate() {
        let mut writer = OutputWriter::new(FailingSink, OutputFormat::Text);
        let err = writer.write(&sample()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("TEXT"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("jsonl"), None);
    }
}
