//! Filesystem sink
//!
//! Downloads land as files in an output directory. The print surface is the
//! same directory: the HTML report is written there for the user to open and
//! print. A sink can be configured without a print surface, in which case
//! printing fails with [`ExportError::PrintWindowBlocked`].

use crate::export::{ExportArtifact, ExportError, ExportSink};
use std::path::{Path, PathBuf};
use tracing::info;

/// Sink writing artifacts into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    print_available: bool,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            print_available: true,
        }
    }

    /// Disable the print surface (headless runs, pop-up blockers)
    pub fn without_print(mut self) -> Self {
        self.print_available = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ExportError::Io(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;
        let path = self.dir.join(&artifact.filename);
        std::fs::write(&path, artifact.content.as_bytes())
            .map_err(|e| ExportError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

impl ExportSink for DirectorySink {
    fn download(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
        let path = self.write(artifact)?;
        info!(path = %path.display(), mime = artifact.mime, "Export downloaded");
        Ok(())
    }

    fn print(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
        if !self.print_available {
            return Err(ExportError::PrintWindowBlocked);
        }
        let path = self.write(artifact)?;
        info!(path = %path.display(), "Print report ready");
        Ok(())
    }
}
