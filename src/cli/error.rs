//! CLI error type

use crate::admin::AdminError;
use crate::auth::SessionError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::fetch::FetchError;
use crate::storage::StorageError;

/// Errors surfaced by CLI commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Failed to load reference data: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
