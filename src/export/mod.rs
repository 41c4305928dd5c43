//! Export functionality
//!
//! Renders decorated rows into downloadable artifacts:
//! - CSV (download)
//! - HTML report (print)
//!
//! Rendering is pure; artifacts are handed to an [`ExportSink`] which owns the
//! download and print surfaces.

pub mod csv;
pub mod html;
pub mod sink;

use crate::fetch::FetchError;
use crate::models::DatasetId;
use chrono::NaiveDate;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Render error: {0}")]
    Render(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Print window could not be opened; allow pop-ups and retry")]
    PrintWindowBlocked,
    #[error("An export is already running")]
    AlreadyRunning,
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Html => "text/html",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "html" | "print" | "pdf" => Ok(ExportFormat::Html),
            _ => Err(format!("Unknown export format: {}. Expected csv or html", s)),
        }
    }
}

/// A rendered export ready for a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
    pub format: ExportFormat,
}

impl ExportArtifact {
    pub fn new(dataset: DatasetId, date: NaiveDate, format: ExportFormat, content: String) -> Self {
        Self {
            filename: artifact_filename(dataset, date, format),
            mime: format.mime(),
            content,
            format,
        }
    }
}

/// `{dataset}_{YYYY-MM-DD}.{ext}`
pub fn artifact_filename(dataset: DatasetId, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        dataset.as_str(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Destination of rendered artifacts
pub trait ExportSink: Send + Sync {
    /// Offer a file for download
    fn download(&self, artifact: &ExportArtifact) -> Result<(), ExportError>;

    /// Open a print surface showing the artifact
    fn print(&self, artifact: &ExportArtifact) -> Result<(), ExportError>;
}

pub use self::csv::CsvExporter;
pub use self::html::HtmlExporter;
pub use self::sink::DirectorySink;
