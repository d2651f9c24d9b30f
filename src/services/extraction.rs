// src/services/extraction.rs

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

/// Errors raised while turning an uploaded file into text.
#[derive(Debug)]
pub enum ExtractionError {
    /// File extension we have no converter for.
    UnsupportedFormat(String),
    /// The converter ran but produced no text.
    Empty,
    /// The converter could not be started or exited with an error.
    Converter(String),
    Io(std::io::Error),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::UnsupportedFormat(ext) => write!(f, "Unsupported file type '{}'", ext),
            ExtractionError::Empty => write!(f, "No text could be extracted from the document"),
            ExtractionError::Converter(msg) => write!(f, "{}", msg),
            ExtractionError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::Io(err)
    }
}

/// Turns a stored upload into plain text or markdown.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// `file_name` is the client-facing name; its extension selects the converter.
    async fn extract(&self, path: &Path, file_name: &str) -> Result<String, ExtractionError>;
}

/// How a given extension is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Pdftotext,
    Pandoc,
    PlainText,
}

/// Maps a file name to the converter that handles it.
pub fn converter_for(file_name: &str) -> Result<Converter, ExtractionError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(Converter::Pdftotext),
        "docx" | "odt" | "rtf" | "html" | "htm" | "epub" => Ok(Converter::Pandoc),
        "txt" | "md" | "markdown" => Ok(Converter::PlainText),
        _ => Err(ExtractionError::UnsupportedFormat(ext)),
    }
}

/// Extractor backed by the `pdftotext` (poppler) and `pandoc` command line tools.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    pdftotext_bin: String,
    pandoc_bin: String,
}

impl CommandExtractor {
    pub fn new(pdftotext_bin: impl Into<String>, pandoc_bin: impl Into<String>) -> Self {
        Self {
            pdftotext_bin: pdftotext_bin.into(),
            pandoc_bin: pandoc_bin.into(),
        }
    }

    async fn run(&self, program: &str, args: &[&OsStr]) -> Result<String, ExtractionError> {
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                tracing::error!("Failed to run {}: {}", program, e);
                ExtractionError::Converter(format!("{} not available", program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("{} failed: {}", program, stderr);
            return Err(ExtractionError::Converter(format!(
                "{} exited with {}",
                program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract(&self, path: &Path, file_name: &str) -> Result<String, ExtractionError> {
        let converter = converter_for(file_name)?;
        tracing::debug!(?converter, file_name, "extracting text");

        let raw = match converter {
            Converter::Pdftotext => {
                self.run(
                    &self.pdftotext_bin,
                    &[OsStr::new("-layout"), path.as_os_str(), OsStr::new("-")],
                )
                .await?
            }
            Converter::Pandoc => {
                self.run(
                    &self.pandoc_bin,
                    &[path.as_os_str(), OsStr::new("-t"), OsStr::new("gfm")],
                )
                .await?
            }
            Converter::PlainText => {
                let bytes = tokio::fs::read(path).await?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };

        let text = raw.trim();
        if text.is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(text.to_string())
    }
}
